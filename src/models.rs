use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Synced calendar events (sync-owned; mutated only by re-sync)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// ISO-8601 start, either `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS[offset]`.
    pub start: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsDoc {
    #[serde(default)]
    pub last_sync: Option<String>,
    #[serde(default)]
    pub events: BTreeMap<String, EventRecord>,
}

/// An event as delivered by the (external) calendar sync collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchedEvent {
    pub id: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub title: String,
}

// ---------------------------------------------------------------------------
// Concert overrides (user-owned; never written by sync)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcertOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
}

impl ConcertOverride {
    pub fn is_empty(&self) -> bool {
        self.artist.is_none()
            && self.event.is_none()
            && self.location.is_none()
            && self.substitute.is_none()
            && self.fee.is_none()
    }
}

pub type ConcertOverridesDoc = BTreeMap<String, ConcertOverride>;

// ---------------------------------------------------------------------------
// Agencies (fee-default source)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
    #[serde(default)]
    pub base_fee: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agency {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tax_id: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgenciesDoc {
    #[serde(default)]
    pub agencies: Vec<Agency>,
}

// ---------------------------------------------------------------------------
// Canonical concert (derived, not persisted)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalConcert {
    pub id: String,
    /// Raw start string, kept for ordering.
    pub start: String,
    /// Calendar day, when the start string parsed.
    pub day: Option<NaiveDate>,
    /// Display date DD/MM/YYYY (falls back to the raw start when unparsable).
    pub date: String,
    /// Display time HH:MM, empty for all-day events.
    pub time: String,
    pub year: i32,
    pub month: u32,
    pub artist: String,
    pub event: String,
    pub location: String,
    pub substitute: String,
    pub fee: String,
    /// Round-trip km from the distance cache; None = unknown (cache miss).
    pub km: Option<f64>,
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

/// A normalized spreadsheet expense row. Identity is the composite key
/// (invoice_date, supplier, invoice_number) — see `expenses::composite_key`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Normalized YYYY-MM-DD.
    pub invoice_date: String,
    pub supplier: String,
    #[serde(default)]
    pub tax_id: String,
    pub invoice_number: String,
    #[serde(default)]
    pub description: String,
    /// Category label as synced ("Tipo Despesa"); may be overridden.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub taxable_base: f64,
    #[serde(default)]
    pub base_6: f64,
    #[serde(default)]
    pub vat_6: f64,
    #[serde(default)]
    pub base_13: f64,
    #[serde(default)]
    pub vat_13: f64,
    #[serde(default)]
    pub base_23: f64,
    #[serde(default)]
    pub vat_23: f64,
    #[serde(default)]
    pub vat_total: f64,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub currency: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpensesDoc {
    #[serde(default)]
    pub last_sync: Option<String>,
    #[serde(default)]
    pub rows: Vec<ExpenseRecord>,
}

/// Category label overrides, keyed by the expense composite key.
pub type ExpenseOverridesDoc = BTreeMap<String, String>;

/// An expense row with its category resolved and tax metadata attached.
#[derive(Debug, Clone)]
pub struct EnrichedExpense {
    pub key: String,
    pub record: ExpenseRecord,
    pub category: String,
    pub snc_account: &'static str,
    pub snc_label: &'static str,
    pub vat_factor: f64,
    pub vat_deductible: f64,
    pub vat_nondeductible: f64,
    /// Corporate-tax-relevant cost: taxable base + non-deductible VAT.
    pub irc_cost: f64,
    pub is_representation: bool,
    pub autonomous_tax: f64,
}

// ---------------------------------------------------------------------------
// Fiscal configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalConfig {
    /// VAT rate charged on concert income, percent.
    #[serde(default = "default_vat_income_rate")]
    pub vat_income_rate: f64,
    /// Reduced IRC rate on the first bracket, percent.
    #[serde(default = "default_irc_reduced_rate")]
    pub irc_reduced_rate: f64,
    /// Annual result threshold below which the reduced rate applies.
    #[serde(default = "default_irc_reduced_threshold")]
    pub irc_reduced_threshold: f64,
    /// Normal IRC rate on the excess, percent.
    #[serde(default = "default_irc_normal_rate")]
    pub irc_normal_rate: f64,
    /// Municipal surcharge (derrama), percent of the annual result.
    #[serde(default = "default_surcharge_rate")]
    pub surcharge_rate: f64,
    /// Mileage compensation, euro per km.
    #[serde(default = "default_mileage_rate")]
    pub mileage_rate: f64,
}

fn default_vat_income_rate() -> f64 {
    23.0
}
fn default_irc_reduced_rate() -> f64 {
    16.0
}
fn default_irc_reduced_threshold() -> f64 {
    50_000.0
}
fn default_irc_normal_rate() -> f64 {
    21.0
}
fn default_surcharge_rate() -> f64 {
    1.5
}
fn default_mileage_rate() -> f64 {
    0.40
}

impl Default for FiscalConfig {
    fn default() -> Self {
        Self {
            vat_income_rate: default_vat_income_rate(),
            irc_reduced_rate: default_irc_reduced_rate(),
            irc_reduced_threshold: default_irc_reduced_threshold(),
            irc_normal_rate: default_irc_normal_rate(),
            surcharge_rate: default_surcharge_rate(),
            mileage_rate: default_mileage_rate(),
        }
    }
}
