//! Key-value storage backends.
//!
//! This module defines the `KeyValueStore` trait, a synchronous string-keyed
//! store shared by every preference store, plus two implementations:
//! `MemoryStore` for tests and ephemeral sessions and `SqliteStore` for the
//! durable on-disk copy.
//!
//! Values are opaque strings. Callers encode JSON themselves through
//! [`read_json`] and [`write_json`]; a value that fails to decode is treated
//! as if it were absent.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use weatherdash_core::error::{RusqliteErrorExt, StorageError};

/// Result type for store writes.
pub type StoreResult<T> = Result<T, StorageError>;

/// Synchronous string-keyed storage.
///
/// Reads are infallible: a missing key, or a backend that cannot be read,
/// yields `None`. Writes can fail (disk full, closed database) and the error
/// is handed back to the caller untouched.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Decode the JSON value under `key`, falling back to `T::default()` when
/// the key is absent or the stored text is malformed.
pub fn read_json<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key) else {
        return T::default();
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, "Ignoring malformed stored value: {}", e);
            T::default()
        }
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn write_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> StoreResult<()>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// In-memory store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// SQLite-backed store: one `kv` table of text keys and values.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    ///
    /// Creates the parent directory, the database file and the schema if
    /// they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| e.into_storage_error())?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        tracing::debug!("Opened key-value store at {}", path.display());
        Ok(store)
    }

    #[cfg(test)]
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| e.into_storage_error())?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.conn
            .lock()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL
                );
                "#,
            )
            .map_err(|e| e.into_storage_error())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Option<String> {
        let conn = self.conn.lock();
        let result = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional();

        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, "Key-value read failed, treating as absent: {}", e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(|e| e.into_storage_error())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| e.into_storage_error())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn exercise(store: &dyn KeyValueStore) {
        assert_eq!(store.get("missing"), None);

        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("1"));

        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("2"));

        store.remove("a").unwrap();
        assert_eq!(store.get("a"), None);

        // Removing twice is fine
        store.remove("a").unwrap();
    }

    #[test]
    fn test_memory_store_contract() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn test_sqlite_store_contract() {
        exercise(&SqliteStore::in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("kv.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("removed-cities", "[\"tokyo\"]").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("removed-cities").as_deref(), Some("[\"tokyo\"]"));
    }

    #[test]
    fn test_read_json_missing_key_is_default() {
        let store = MemoryStore::new();
        let cities: Vec<String> = read_json(&store, "removed-cities");
        assert!(cities.is_empty());
    }

    #[test]
    fn test_read_json_malformed_is_default() {
        let store = MemoryStore::new();
        store.set("removed-cities", "{not json").unwrap();
        let cities: Vec<String> = read_json(&store, "removed-cities");
        assert!(cities.is_empty());

        // Valid JSON of the wrong shape is also treated as absent
        store.set("removed-cities", "{\"a\":1}").unwrap();
        let cities: Vec<String> = read_json(&store, "removed-cities");
        assert!(cities.is_empty());
    }

    #[test]
    fn test_write_then_read_json() {
        let store = MemoryStore::new();
        write_json(&store, "excluded-cities", &["bombay", "goa"]).unwrap();
        let cities: Vec<String> = read_json(&store, "excluded-cities");
        assert_eq!(cities, vec!["bombay", "goa"]);
        assert_eq!(store.len(), 1);
    }
}
