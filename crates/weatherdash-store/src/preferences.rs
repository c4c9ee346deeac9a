//! Per-city user preferences: the favorite flag and free-text notes.
//!
//! All records live as one JSON array under [`USER_DATA_KEY`]. A record whose
//! favorite flag is off and whose notes are empty is never stored; saving
//! such a record deletes the existing one instead.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::kv::{read_json, write_json, KeyValueStore, StoreResult};

/// Storage key holding every preference record.
pub const USER_DATA_KEY: &str = "user-data";

/// What the user has recorded about one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferenceRecord {
    pub city_id: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub notes: String,
}

impl UserPreferenceRecord {
    pub fn new(city_id: impl Into<String>, is_favorite: bool, notes: impl Into<String>) -> Self {
        Self {
            city_id: city_id.into(),
            is_favorite,
            notes: notes.into(),
        }
    }

    /// True when neither field carries anything worth storing.
    pub fn is_empty(&self) -> bool {
        !self.is_favorite && self.notes.is_empty()
    }
}

/// CRUD over [`UserPreferenceRecord`]s.
///
/// Lookups are by exact key; callers normalize city identifiers first
/// (see `weatherdash_weather::normalize::city_key`).
#[derive(Clone)]
pub struct UserPreferenceStore {
    store: Arc<dyn KeyValueStore>,
}

impl UserPreferenceStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Every stored record, or an empty list if none (or unreadable).
    pub fn get_all(&self) -> Vec<UserPreferenceRecord> {
        read_json(self.store.as_ref(), USER_DATA_KEY)
    }

    /// Records whose favorite flag is set, in storage order.
    pub fn get_favorites(&self) -> Vec<UserPreferenceRecord> {
        self.get_all()
            .into_iter()
            .filter(|record| record.is_favorite)
            .collect()
    }

    /// Identifiers of all favorite cities, in storage order.
    pub fn favorite_ids(&self) -> Vec<String> {
        self.get_favorites()
            .into_iter()
            .map(|record| record.city_id)
            .collect()
    }

    pub fn get(&self, city_id: &str) -> Option<UserPreferenceRecord> {
        self.get_all()
            .into_iter()
            .find(|record| record.city_id == city_id)
    }

    /// Store `record`, replacing any existing record for the same city.
    ///
    /// This is a full overwrite, not a field merge: a caller toggling the
    /// favorite flag must pass the current notes or they are lost. Use
    /// [`set_favorite`](Self::set_favorite), [`save_notes`](Self::save_notes)
    /// or [`delete_notes`](Self::delete_notes) to change a single field.
    ///
    /// An empty record deletes the existing entry, and is not written at all
    /// when there is nothing to delete.
    pub fn save(&self, record: UserPreferenceRecord) -> StoreResult<()> {
        let mut records = self.get_all();
        let existing = records.iter().position(|r| r.city_id == record.city_id);

        match existing {
            Some(index) if record.is_empty() => {
                tracing::debug!(city = %record.city_id, "Deleting empty preference record");
                records.remove(index);
            }
            Some(index) => {
                records[index] = record;
            }
            None if record.is_empty() => return Ok(()),
            None => {
                tracing::debug!(city = %record.city_id, "Creating preference record");
                records.push(record);
            }
        }

        write_json(self.store.as_ref(), USER_DATA_KEY, &records)
    }

    /// Set the favorite flag, keeping whatever notes are stored.
    pub fn set_favorite(&self, city_id: &str, is_favorite: bool) -> StoreResult<UserPreferenceRecord> {
        let notes = self.get(city_id).map(|r| r.notes).unwrap_or_default();
        let record = UserPreferenceRecord::new(city_id, is_favorite, notes);
        self.save(record.clone())?;
        Ok(record)
    }

    /// Replace the notes, keeping the stored favorite flag.
    pub fn save_notes(&self, city_id: &str, notes: &str) -> StoreResult<UserPreferenceRecord> {
        let is_favorite = self.get(city_id).is_some_and(|r| r.is_favorite);
        let record = UserPreferenceRecord::new(city_id, is_favorite, notes);
        self.save(record.clone())?;
        Ok(record)
    }

    /// Clear the notes, keeping the stored favorite flag.
    pub fn delete_notes(&self, city_id: &str) -> StoreResult<UserPreferenceRecord> {
        self.save_notes(city_id, "")
    }
}
