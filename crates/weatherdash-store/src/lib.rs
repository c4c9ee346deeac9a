//! Local persistence for the weather dashboard.
//!
//! Everything here sits on an injected [`KeyValueStore`]: user preferences
//! (favorites and notes) and the removed/restored/excluded city lists.

pub mod kv;
pub mod lifecycle;
pub mod preferences;

pub use kv::{read_json, write_json, KeyValueStore, MemoryStore, SqliteStore, StoreResult};
pub use lifecycle::{CityLifecycleStore, CityLists};
pub use preferences::{UserPreferenceRecord, UserPreferenceStore, USER_DATA_KEY};
