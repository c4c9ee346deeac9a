//! Whether the user has allowed "my location" lookups.

use std::sync::Arc;

use weatherdash_store::{read_json, write_json, KeyValueStore, StoreResult};

/// Storage key holding the permission flag.
pub const LOCATION_GRANTED_KEY: &str = "is-location-granted";

#[derive(Clone)]
pub struct LocationPermission {
    store: Arc<dyn KeyValueStore>,
}

impl LocationPermission {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// False until granted, and whenever the stored flag is unreadable.
    pub fn is_granted(&self) -> bool {
        read_json(self.store.as_ref(), LOCATION_GRANTED_KEY)
    }

    pub fn set_granted(&self, granted: bool) -> StoreResult<()> {
        tracing::info!(granted, "Location permission changed");
        write_json(self.store.as_ref(), LOCATION_GRANTED_KEY, &granted)
    }
}
