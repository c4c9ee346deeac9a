//! Removed, restored and excluded city lists.
//!
//! Removed and restored are independent insertion-ordered lists without
//! duplicates. Moving a city from one list to the other always retracts it
//! from the source list before appending it to the target.
//!
//! Excluded is a frozen copy of removed, refreshed only when the user asks
//! for a new page of candidate cities; it is the exclusion filter sent to
//! the remote city listing.

use std::sync::Arc;

use crate::kv::{read_json, write_json, KeyValueStore, StoreResult};

pub const REMOVED_CITIES_KEY: &str = "removed-cities";
pub const RESTORED_CITIES_KEY: &str = "restored-cities";
pub const EXCLUDED_CITIES_KEY: &str = "excluded-cities";

/// Removed and restored lists as they stand after an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityLists {
    pub removed: Vec<String>,
    pub restored: Vec<String>,
}

#[derive(Clone)]
pub struct CityLifecycleStore {
    store: Arc<dyn KeyValueStore>,
}

impl CityLifecycleStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn removed(&self) -> Vec<String> {
        read_json(self.store.as_ref(), REMOVED_CITIES_KEY)
    }

    pub fn restored(&self) -> Vec<String> {
        read_json(self.store.as_ref(), RESTORED_CITIES_KEY)
    }

    pub fn excluded(&self) -> Vec<String> {
        read_json(self.store.as_ref(), EXCLUDED_CITIES_KEY)
    }

    pub fn is_removed(&self, city_id: &str) -> bool {
        self.removed().iter().any(|c| c == city_id)
    }

    /// Dismiss a city: drop it from restored, then append it to removed.
    pub fn remove(&self, city_id: &str) -> StoreResult<CityLists> {
        let restored = self.retract(RESTORED_CITIES_KEY, city_id)?;
        let removed = self.append(REMOVED_CITIES_KEY, city_id)?;
        tracing::debug!(city = city_id, removed = removed.len(), "City removed");
        Ok(CityLists { removed, restored })
    }

    /// Bring a city back: drop it from removed, then append it to restored.
    pub fn restore(&self, city_id: &str) -> StoreResult<CityLists> {
        let removed = self.retract(REMOVED_CITIES_KEY, city_id)?;
        let restored = self.append(RESTORED_CITIES_KEY, city_id)?;
        tracing::debug!(city = city_id, restored = restored.len(), "City restored");
        Ok(CityLists { removed, restored })
    }

    /// Overwrite excluded with the current removed list, verbatim.
    pub fn commit_exclusions(&self) -> StoreResult<Vec<String>> {
        let removed = self.removed();
        write_json(self.store.as_ref(), EXCLUDED_CITIES_KEY, &removed)?;
        tracing::info!(count = removed.len(), "Committed city exclusions");
        Ok(removed)
    }

    fn append(&self, key: &str, city_id: &str) -> StoreResult<Vec<String>> {
        let mut cities: Vec<String> = read_json(self.store.as_ref(), key);
        if !cities.iter().any(|c| c == city_id) {
            cities.push(city_id.to_string());
            write_json(self.store.as_ref(), key, &cities)?;
        }
        Ok(cities)
    }

    fn retract(&self, key: &str, city_id: &str) -> StoreResult<Vec<String>> {
        let mut cities: Vec<String> = read_json(self.store.as_ref(), key);
        let before = cities.len();
        cities.retain(|c| c != city_id);
        if cities.len() != before {
            write_json(self.store.as_ref(), key, &cities)?;
        }
        Ok(cities)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::kv::MemoryStore;

    fn create_test_store() -> CityLifecycleStore {
        CityLifecycleStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_empty_when_absent() {
        let lifecycle = create_test_store();
        assert!(lifecycle.removed().is_empty());
        assert!(lifecycle.restored().is_empty());
        assert!(lifecycle.excluded().is_empty());
    }

    #[test]
    fn test_remove_then_restore() {
        let lifecycle = create_test_store();

        lifecycle.remove("tokyo").unwrap();
        let lists = lifecycle.restore("tokyo").unwrap();

        assert!(!lists.removed.contains(&"tokyo".to_string()));
        assert!(lists.restored.contains(&"tokyo".to_string()));
        assert_eq!(lifecycle.removed(), lists.removed);
        assert_eq!(lifecycle.restored(), lists.restored);
    }

    #[test]
    fn test_restore_then_remove() {
        let lifecycle = create_test_store();

        lifecycle.restore("tokyo").unwrap();
        let lists = lifecycle.remove("tokyo").unwrap();

        assert_eq!(lists.removed, vec!["tokyo"]);
        assert!(lists.restored.is_empty());
    }

    #[test]
    fn test_repeated_operations_do_not_duplicate() {
        let lifecycle = create_test_store();

        lifecycle.remove("goa").unwrap();
        let once = lifecycle.removed();
        lifecycle.remove("goa").unwrap();
        assert_eq!(lifecycle.removed(), once);

        lifecycle.restore("goa").unwrap();
        let once = lifecycle.restored();
        lifecycle.restore("goa").unwrap();
        assert_eq!(lifecycle.restored(), once);
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let lifecycle = create_test_store();

        lifecycle.remove("tokyo").unwrap();
        lifecycle.remove("bombay").unwrap();
        lifecycle.remove("rajkot").unwrap();
        lifecycle.restore("bombay").unwrap();
        lifecycle.remove("ajmer").unwrap();

        assert_eq!(lifecycle.removed(), vec!["tokyo", "rajkot", "ajmer"]);
        assert_eq!(lifecycle.restored(), vec!["bombay"]);
    }

    #[test]
    fn test_commit_exclusions_overwrites() {
        let lifecycle = create_test_store();

        lifecycle.remove("tokyo").unwrap();
        lifecycle.remove("bombay").unwrap();
        lifecycle.commit_exclusions().unwrap();
        assert_eq!(lifecycle.excluded(), vec!["tokyo", "bombay"]);

        // Later removals don't leak into excluded until the next commit
        lifecycle.restore("tokyo").unwrap();
        lifecycle.remove("goa").unwrap();
        assert_eq!(lifecycle.excluded(), vec!["tokyo", "bombay"]);

        let excluded = lifecycle.commit_exclusions().unwrap();
        assert_eq!(excluded, vec!["bombay", "goa"]);
        assert_eq!(lifecycle.excluded(), vec!["bombay", "goa"]);
    }

    #[test]
    fn test_is_removed() {
        let lifecycle = create_test_store();
        lifecycle.remove("tokyo").unwrap();
        assert!(lifecycle.is_removed("tokyo"));
        assert!(!lifecycle.is_removed("goa"));
    }
}
