use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fmt::round1;
use crate::store::{DataDir, DISTANCES_FILE};

/// Cache format version. v1 stored one-way kilometres; v2 stores the
/// round trip.
pub const CACHE_VERSION: u32 = 2;

/// Location → round-trip distance cache.
///
/// Persisted as a flat JSON object with a `__version` tag next to the
/// entries. The cache is only ever populated by an explicit sync; a miss
/// during display means "unknown", never a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceCache {
    #[serde(rename = "__version", default = "version_one")]
    pub version: u32,
    #[serde(flatten)]
    pub entries: BTreeMap<String, f64>,
}

fn version_one() -> u32 {
    1
}

impl Default for DistanceCache {
    fn default() -> Self {
        Self {
            version: 1,
            entries: BTreeMap::new(),
        }
    }
}

impl DistanceCache {
    /// Round-trip km for a location, if cached.
    pub fn get(&self, location: &str) -> Option<f64> {
        self.entries.get(location).copied()
    }

    /// Cache a one-way distance as the round trip (doubled, 0.1 km).
    pub fn put_one_way(&mut self, location: &str, one_way_km: f64) {
        self.entries
            .insert(location.to_string(), round1(one_way_km * 2.0));
        self.version = CACHE_VERSION;
    }

    /// One-time v1 → v2 migration: double every stored value and bump the
    /// tag. A no-op (returns false) on an already-current store.
    pub fn migrate(&mut self) -> bool {
        if self.version >= CACHE_VERSION {
            return false;
        }
        for value in self.entries.values_mut() {
            *value = round1(*value * 2.0);
        }
        self.version = CACHE_VERSION;
        true
    }
}

/// Load the cache, running the migration exactly once (persisting it so a
/// later load sees a current store).
pub fn load_migrated(data: &DataDir) -> Result<DistanceCache> {
    let mut cache: DistanceCache = data.read_doc(DISTANCES_FILE)?;
    if cache.migrate() {
        data.write_doc(DISTANCES_FILE, &cache)?;
    }
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_migrates_exactly_once() {
        let mut cache = DistanceCache::default();
        cache
            .entries
            .insert("Porto, Portugal".to_string(), 59.1);
        assert!(cache.migrate());
        assert_eq!(cache.get("Porto, Portugal"), Some(118.2));
        assert_eq!(cache.version, CACHE_VERSION);
        // Second run is a no-op.
        assert!(!cache.migrate());
        assert_eq!(cache.get("Porto, Portugal"), Some(118.2));
    }

    #[test]
    fn test_put_one_way_doubles() {
        let mut cache = DistanceCache::default();
        cache.put_one_way("Braga, Portugal", 27.35);
        assert_eq!(cache.get("Braga, Portugal"), Some(54.7));
        assert_eq!(cache.version, CACHE_VERSION);
    }

    #[test]
    fn test_miss_is_none() {
        let cache = DistanceCache::default();
        assert_eq!(cache.get("Faro, Portugal"), None);
    }

    #[test]
    fn test_serialized_form_carries_version_tag() {
        let mut cache = DistanceCache::default();
        cache.put_one_way("Porto, Portugal", 59.1);
        let json = serde_json::to_string(&cache).unwrap();
        assert!(json.contains("\"__version\":2"));
        assert!(json.contains("\"Porto, Portugal\":118.2"));
    }

    #[test]
    fn test_untagged_store_reads_as_v1() {
        let cache: DistanceCache =
            serde_json::from_str(r#"{"Porto, Portugal": 59.1}"#).unwrap();
        assert_eq!(cache.version, 1);
        assert_eq!(cache.get("Porto, Portugal"), Some(59.1));
    }

    #[test]
    fn test_load_migrated_persists_bumped_store() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataDir::new(dir.path()).unwrap();
        std::fs::write(
            data.path(DISTANCES_FILE),
            r#"{"__version": 1, "Porto, Portugal": 59.1}"#,
        )
        .unwrap();
        let cache = load_migrated(&data).unwrap();
        assert_eq!(cache.get("Porto, Portugal"), Some(118.2));
        let again = load_migrated(&data).unwrap();
        assert_eq!(again, cache);
    }
}
