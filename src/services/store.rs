use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Persistent key/value storage the engine writes caches and stats to.
/// Writes report success; a failed write leaves the caller running on its
/// in-memory copy.
pub trait KeyValueStore: Send + Sync {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&self, key: &str, value: &str) -> bool;
    fn remove(&self, key: &str) -> bool;
}

/// Typed JSON access on top of any store.
pub trait StoreExt {
    /// Missing or malformed values yield `default`.
    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T;
    fn put<T: Serialize>(&self, key: &str, value: &T) -> bool;
}

impl<S: KeyValueStore + ?Sized> StoreExt for S {
    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(raw) = self.get_raw(key) else {
            return default;
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Discarding malformed value under '{}': {}", key, e);
                self.remove(key);
                default
            }
        }
    }

    fn put<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_raw(key, &raw),
            Err(e) => {
                warn!("Failed to encode value for '{}': {}", key, e);
                false
            }
        }
    }
}

/// Store that lives for the process only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: &str) -> bool {
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), value.to_string());
                true
            }
            Err(_) => false,
        }
    }

    fn remove(&self, key: &str) -> bool {
        match self.entries.write() {
            Ok(mut entries) => entries.remove(key).is_some(),
            Err(_) => false,
        }
    }
}

/// Store backed by a single JSON object on disk. Every write rewrites the
/// file; if that fails the value is still kept in memory.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Store file {} is corrupt, starting empty: {}", path.display(), e);
                HashMap::new()
            }),
            Err(e) => {
                debug!("No store file at {} ({}), starting empty", path.display(), e);
                HashMap::new()
            }
        };

        Self { path, entries: RwLock::new(entries) }
    }

    fn flush(&self, entries: &HashMap<String, String>) -> bool {
        let text = match serde_json::to_string(entries) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to encode store: {}", e);
                return false;
            }
        };
        match fs::write(&self.path, text) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to write store file {}: {}", self.path.display(), e);
                false
            }
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: &str) -> bool {
        let Ok(mut entries) = self.entries.write() else {
            return false;
        };
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> bool {
        let Ok(mut entries) = self.entries.write() else {
            return false;
        };
        if entries.remove(key).is_none() {
            return false;
        }
        self.flush(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        value: u32,
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("wordrush-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_get_or_returns_default_when_missing() {
        let store = MemoryStore::new();
        assert_eq!(store.get_or("missing", 42u32), 42);
    }

    #[test]
    fn test_put_then_get() {
        let store = MemoryStore::new();
        let record = Record { name: "x".to_string(), value: 3 };
        assert!(store.put("rec", &record));
        let back: Option<Record> = store.get_or("rec", None);
        assert_eq!(back, Some(record));
    }

    #[test]
    fn test_malformed_value_is_discarded() {
        let store = MemoryStore::new();
        store.set_raw("rec", "{not json");
        let back: Option<Record> = store.get_or("rec", None);
        assert_eq!(back, None);
        assert_eq!(store.get_raw("rec"), None);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let path = temp_path("persist");
        let _ = fs::remove_file(&path);

        let store = JsonFileStore::open(&path);
        assert!(store.put("best", &17u32));
        drop(store);

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get_or("best", 0u32), 17);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_corrupt_file_starts_empty() {
        let path = temp_path("corrupt");
        fs::write(&path, "garbage").unwrap();
        let store = JsonFileStore::open(&path);
        assert_eq!(store.get_raw("anything"), None);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_write_failure_keeps_memory_value() {
        let dir = temp_path("dir-as-file");
        fs::create_dir_all(&dir).unwrap();
        // Writing to a directory path fails.
        let store = JsonFileStore::open(&dir);
        assert!(!store.set_raw("k", "\"v\""));
        assert_eq!(store.get_raw("k").as_deref(), Some("\"v\""));
        let _ = fs::remove_dir_all(&dir);
    }
}
