//! Best-effort key-value persistence
//!
//! Everything RetroBot remembers (mood, profile, todos, calendar, music
//! settings, the user's name) is an opaque JSON blob under a fixed key.
//! Storage is a cache, not a database: failures are logged and swallowed,
//! corrupt or missing blobs load as defaults.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Key-value store for JSON blobs
///
/// Implementations must never panic or surface errors to callers.
pub trait Storage: Send + Sync {
    /// Store `value` under `key`, replacing any previous value
    fn save(&self, key: &str, value: &Value);

    /// Fetch the value under `key`, if present and readable
    fn load(&self, key: &str) -> Option<Value>;
}

/// Serialize and save a typed value
pub fn save_as<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(json) => storage.save(key, &json),
        Err(e) => warn!(key, error = %e, "Failed to serialize value for storage"),
    }
}

/// Load a typed value, falling back to `T::default()` on absence or corruption
pub fn load_or_default<T: DeserializeOwned + Default>(storage: &dyn Storage, key: &str) -> T {
    load_as(storage, key).unwrap_or_default()
}

/// Load a typed value, `None` on absence or corruption
pub fn load_as<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let value = storage.load(key)?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, error = %e, "Stored value is corrupt, using defaults");
            None
        }
    }
}

// ============================================================================
// In-memory storage
// ============================================================================

/// Volatile storage, used by tests and the headless driver
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, value: &Value) {
        self.entries.lock().insert(key.to_string(), value.clone());
    }

    fn load(&self, key: &str) -> Option<Value> {
        self.entries.lock().get(key).cloned()
    }
}

// ============================================================================
// File storage
// ============================================================================

/// One JSON file per key inside a directory
///
/// Defaults to `$XDG_DATA_HOME/retrobot/`.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Store files in `dir` (created lazily on first save)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The default data directory, if the platform has one
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("retrobot"))
    }

    /// Directory holding the files
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, value: &Value) {
        let path = self.path_for(key);
        let result = fs::create_dir_all(&self.dir)
            .and_then(|()| serde_json::to_vec_pretty(value).map_err(std::io::Error::other))
            .and_then(|bytes| fs::write(&path, bytes));

        match result {
            Ok(()) => debug!(key, path = %path.display(), "Saved"),
            Err(e) => warn!(key, path = %path.display(), error = %e, "Save failed"),
        }
    }

    fn load(&self, key: &str) -> Option<Value> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key, path = %path.display(), error = %e, "Load failed");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, path = %path.display(), error = %e, "Stored file is not valid JSON");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Settings {
        volume: u8,
        name: String,
    }

    #[test]
    fn test_memory_round_trip() {
        let storage = MemoryStorage::new();
        save_as(&storage, "settings", &Settings { volume: 70, name: "Ada".into() });

        let loaded: Settings = load_or_default(&storage, "settings");
        assert_eq!(loaded, Settings { volume: 70, name: "Ada".into() });
        assert_eq!(storage.keys(), vec!["settings"]);
    }

    #[test]
    fn test_corrupt_value_loads_default() {
        let storage = MemoryStorage::new();
        storage.save("settings", &json!({"volume": "loud"}));
        let loaded: Settings = load_or_default(&storage, "settings");
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::new(dir.path()).save("retrobot-data", &json!({"interactionCount": 3}));

        let reopened = FileStorage::new(dir.path());
        assert_eq!(
            reopened.load("retrobot-data"),
            Some(json!({"interactionCount": 3}))
        );
        assert!(dir.path().join("retrobot-data.json").exists());
    }

    #[test]
    fn test_file_storage_swallows_garbage() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("retrobot-todos.json"), b"{not json").unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.load("retrobot-todos"), None);
        assert_eq!(storage.load("never-saved"), None);
    }

    #[test]
    fn test_file_storage_unwritable_dir_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a dir").unwrap();

        let storage = FileStorage::new(&blocker);
        storage.save("retrobot-data", &json!({}));
        assert_eq!(storage.load("retrobot-data"), None);
    }
}
