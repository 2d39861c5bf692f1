//! Persistent key-value store backing the note repository.
//!
//! # Responsibility
//! - Define the `KvStore` contract: whole-value reads and writes per key.
//! - Provide SQLite-backed and in-memory implementations.
//! - Encode/decode JSON documents stored under one key.
//!
//! # Invariants
//! - Values are written whole; there is no partial or incremental update.
//! - A stored document that fails to decode is reported, never replaced.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod sqlite;

pub use sqlite::SqliteKvStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-layer failure (unavailable backend or corrupt document).
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    MissingRequiredTable(&'static str),
    /// Backend refused the operation.
    Unavailable(String),
    /// Stored document exists but cannot be decoded.
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
    Encode(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
            Self::Corrupt { key, source } => {
                write!(f, "stored document `{key}` is corrupt: {source}")
            }
            Self::Encode(err) => write!(f, "failed to encode document: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Corrupt { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. }
            | Self::MissingRequiredTable(_)
            | Self::Unavailable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Durable string storage addressed by key.
pub trait KvStore {
    /// Returns the stored value, or `None` when the key was never written.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    /// Replaces the whole value stored under `key`.
    fn put(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

/// Volatile store for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates one key, e.g. with a hand-written document.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Makes every subsequent `put` fail, simulating an unavailable backend.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if self.fail_writes {
            return Err(StoreError::Unavailable(format!(
                "memory store rejected write to `{key}`"
            )));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads and decodes the JSON document stored under `key`.
///
/// # Errors
/// - [`StoreError::Corrupt`] when the stored text is not a valid document.
pub fn load_document<T: DeserializeOwned>(
    store: &impl KvStore,
    key: &str,
) -> StoreResult<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })
}

/// Encodes `value` as JSON and stores it under `key`.
pub fn save_document<T: Serialize + ?Sized>(
    store: &mut impl KvStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let encoded = serde_json::to_string(value).map_err(StoreError::Encode)?;
    store.put(key, &encoded)
}

#[cfg(test)]
mod tests {
    use super::{load_document, save_document, KvStore, MemoryKvStore, StoreError};

    #[test]
    fn missing_key_loads_as_none() {
        let store = MemoryKvStore::new();
        let loaded: Option<Vec<i64>> = load_document(&store, "absent").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn document_roundtrip_through_memory_store() {
        let mut store = MemoryKvStore::new();
        save_document(&mut store, "numbers", &vec![3_i64, 1, 2]).unwrap();
        assert_eq!(store.get("numbers").unwrap().as_deref(), Some("[3,1,2]"));
        let loaded: Option<Vec<i64>> = load_document(&store, "numbers").unwrap();
        assert_eq!(loaded, Some(vec![3, 1, 2]));
    }

    #[test]
    fn corrupt_document_is_reported_with_key() {
        let store = MemoryKvStore::new().with_entry("memos", "{not json");
        let err = load_document::<Vec<i64>>(&store, "memos").unwrap_err();
        match err {
            StoreError::Corrupt { key, .. } => assert_eq!(key, "memos"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failing_writes_surface_as_errors() {
        let mut store = MemoryKvStore::new();
        store.set_fail_writes(true);
        assert!(store.put("k", "v").is_err());
        assert!(store.get("k").unwrap().is_none());
    }
}
