use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PalcoError, Result};
use crate::expenses;
use crate::models::{
    AgenciesDoc, ConcertOverridesDoc, EventsDoc, ExpenseOverridesDoc, ExpensesDoc, FiscalConfig,
};

pub const EVENTS_FILE: &str = "events.json";
pub const CONCERT_OVERRIDES_FILE: &str = "concert_overrides.json";
pub const DELETED_EVENTS_FILE: &str = "deleted_events.json";
pub const AGENCIES_FILE: &str = "agencies.json";
pub const DISTANCES_FILE: &str = "distances.json";
pub const EXPENSES_FILE: &str = "expenses.json";
pub const EXPENSE_OVERRIDES_FILE: &str = "expense_overrides.json";
pub const FISCAL_FILE: &str = "fiscal.json";

/// The data directory holding one JSON document per store.
///
/// Every mutation is read-modify-write over the full document, persisted
/// with an atomic replace (write `.tmp`, then rename) so a crash mid-write
/// cannot leave a half-written store behind.
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Open the data directory configured in settings (or `PALCO_DATA_DIR`).
    pub fn open() -> Result<Self> {
        Self::new(crate::settings::get_data_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn read_doc<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.path(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn write_doc<T: Serialize>(&self, name: &str, doc: &T) -> Result<()> {
        let path = self.path(name);
        let tmp = self.path(&format!("{name}.tmp"));
        let json = serde_json::to_string_pretty(doc)?;
        std::fs::write(&tmp, format!("{json}\n"))?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    // -- typed accessors ----------------------------------------------------

    pub fn events(&self) -> Result<EventsDoc> {
        self.read_doc(EVENTS_FILE)
    }

    pub fn save_events(&self, doc: &EventsDoc) -> Result<()> {
        self.write_doc(EVENTS_FILE, doc)
    }

    pub fn concert_overrides(&self) -> Result<ConcertOverridesDoc> {
        self.read_doc(CONCERT_OVERRIDES_FILE)
    }

    pub fn save_concert_overrides(&self, doc: &ConcertOverridesDoc) -> Result<()> {
        self.write_doc(CONCERT_OVERRIDES_FILE, doc)
    }

    pub fn deleted_events(&self) -> Result<Vec<String>> {
        self.read_doc(DELETED_EVENTS_FILE)
    }

    pub fn save_deleted_events(&self, ids: &Vec<String>) -> Result<()> {
        self.write_doc(DELETED_EVENTS_FILE, ids)
    }

    pub fn agencies(&self) -> Result<AgenciesDoc> {
        self.read_doc(AGENCIES_FILE)
    }

    pub fn save_agencies(&self, doc: &AgenciesDoc) -> Result<()> {
        self.write_doc(AGENCIES_FILE, doc)
    }

    pub fn expenses(&self) -> Result<ExpensesDoc> {
        self.read_doc(EXPENSES_FILE)
    }

    pub fn save_expenses(&self, doc: &ExpensesDoc) -> Result<()> {
        self.write_doc(EXPENSES_FILE, doc)
    }

    pub fn expense_overrides(&self) -> Result<ExpenseOverridesDoc> {
        self.read_doc(EXPENSE_OVERRIDES_FILE)
    }

    pub fn save_expense_overrides(&self, doc: &ExpenseOverridesDoc) -> Result<()> {
        self.write_doc(EXPENSE_OVERRIDES_FILE, doc)
    }

    /// Fiscal config; documented defaults are materialized when absent.
    pub fn fiscal_config(&self) -> Result<FiscalConfig> {
        self.read_doc(FISCAL_FILE)
    }

    pub fn save_fiscal_config(&self, cfg: &FiscalConfig) -> Result<()> {
        self.write_doc(FISCAL_FILE, cfg)
    }

    // -- mutation operations ------------------------------------------------

    /// Write a single override field. Only touches the override store; the
    /// synced events document is never read or written here. An empty value
    /// clears the field (a cleared field falls back to the parsed title).
    pub fn set_concert_override_field(&self, id: &str, field: &str, value: &str) -> Result<()> {
        let mut overrides = self.concert_overrides()?;
        let entry = overrides.entry(id.to_string()).or_default();
        let value = value.trim();
        let slot = match field {
            "artist" => &mut entry.artist,
            "event" => &mut entry.event,
            "location" => &mut entry.location,
            "substitute" => &mut entry.substitute,
            "fee" => &mut entry.fee,
            other => return Err(PalcoError::UnknownField(other.to_string())),
        };
        *slot = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
        if entry.is_empty() {
            overrides.remove(id);
        }
        self.save_concert_overrides(&overrides)
    }

    /// Write a category override for an expense composite key. Rejects
    /// categories missing from the rule table; never touches the synced
    /// rows document.
    pub fn set_expense_category(&self, key: &str, category: &str) -> Result<()> {
        if !expenses::is_known_category(category) {
            return Err(PalcoError::UnknownCategory(category.to_string()));
        }
        let mut overrides = self.expense_overrides()?;
        overrides.insert(key.to_string(), category.to_string());
        self.save_expense_overrides(&overrides)
    }

    /// Update one fiscal parameter. Rates are validated here, at write
    /// time — aggregation never clamps.
    pub fn update_fiscal_config(&self, key: &str, value: f64) -> Result<FiscalConfig> {
        let mut cfg = self.fiscal_config()?;
        let is_rate = matches!(
            key,
            "vat_income_rate" | "irc_reduced_rate" | "irc_normal_rate" | "surcharge_rate"
        );
        if is_rate && !(0.0..=100.0).contains(&value) {
            return Err(PalcoError::InvalidRate {
                key: key.to_string(),
                value,
            });
        }
        if matches!(key, "irc_reduced_threshold" | "mileage_rate") && value < 0.0 {
            return Err(PalcoError::Other(format!("{key} must not be negative")));
        }
        match key {
            "vat_income_rate" => cfg.vat_income_rate = value,
            "irc_reduced_rate" => cfg.irc_reduced_rate = value,
            "irc_reduced_threshold" => cfg.irc_reduced_threshold = value,
            "irc_normal_rate" => cfg.irc_normal_rate = value,
            "surcharge_rate" => cfg.surcharge_rate = value,
            "mileage_rate" => cfg.mileage_rate = value,
            other => return Err(PalcoError::UnknownConfigKey(other.to_string())),
        }
        self.save_fiscal_config(&cfg)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventRecord;

    fn test_dir() -> (tempfile::TempDir, DataDir) {
        let dir = tempfile::tempdir().unwrap();
        let data = DataDir::new(dir.path()).unwrap();
        (dir, data)
    }

    #[test]
    fn test_missing_docs_return_defaults() {
        let (_dir, data) = test_dir();
        assert!(data.events().unwrap().events.is_empty());
        assert!(data.concert_overrides().unwrap().is_empty());
        assert!(data.deleted_events().unwrap().is_empty());
        assert_eq!(data.fiscal_config().unwrap(), FiscalConfig::default());
    }

    #[test]
    fn test_write_doc_is_atomic_replace() {
        let (_dir, data) = test_dir();
        let mut doc = EventsDoc::default();
        doc.events.insert(
            "ev1".to_string(),
            EventRecord {
                start: "2025-05-01".to_string(),
                title: "Banda X | Festa, Braga".to_string(),
            },
        );
        data.save_events(&doc).unwrap();
        assert!(data.path(EVENTS_FILE).exists());
        assert!(!data.path(&format!("{EVENTS_FILE}.tmp")).exists());
        let loaded = data.events().unwrap();
        assert_eq!(loaded.events["ev1"].start, "2025-05-01");
    }

    #[test]
    fn test_set_concert_override_field_roundtrip() {
        let (_dir, data) = test_dir();
        data.set_concert_override_field("ev1", "fee", "350").unwrap();
        let ovs = data.concert_overrides().unwrap();
        assert_eq!(ovs["ev1"].fee.as_deref(), Some("350"));
    }

    #[test]
    fn test_set_concert_override_empty_value_clears_field() {
        let (_dir, data) = test_dir();
        data.set_concert_override_field("ev1", "fee", "350").unwrap();
        data.set_concert_override_field("ev1", "fee", "").unwrap();
        assert!(data.concert_overrides().unwrap().is_empty());
    }

    #[test]
    fn test_set_concert_override_rejects_unknown_field() {
        let (_dir, data) = test_dir();
        let err = data.set_concert_override_field("ev1", "cachet", "350");
        assert!(matches!(err, Err(PalcoError::UnknownField(_))));
    }

    #[test]
    fn test_set_expense_category_rejects_unknown() {
        let (_dir, data) = test_dir();
        let err = data.set_expense_category("2025-01-01|X|1", "Nonsense");
        assert!(matches!(err, Err(PalcoError::UnknownCategory(_))));
    }

    #[test]
    fn test_update_fiscal_config_rejects_out_of_range_rate() {
        let (_dir, data) = test_dir();
        let err = data.update_fiscal_config("vat_income_rate", 123.0);
        assert!(matches!(err, Err(PalcoError::InvalidRate { .. })));
        let err = data.update_fiscal_config("surcharge_rate", -1.0);
        assert!(matches!(err, Err(PalcoError::InvalidRate { .. })));
        // Document must be untouched after a rejected write.
        assert_eq!(data.fiscal_config().unwrap(), FiscalConfig::default());
    }

    #[test]
    fn test_update_fiscal_config_persists() {
        let (_dir, data) = test_dir();
        let cfg = data.update_fiscal_config("mileage_rate", 0.36).unwrap();
        assert_eq!(cfg.mileage_rate, 0.36);
        assert_eq!(data.fiscal_config().unwrap().mileage_rate, 0.36);
    }
}
