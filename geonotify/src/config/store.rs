//! Key-value persistence for configuration.
//!
//! Values are plain strings; encoding is the caller's concern. Two providers
//! are available:
//!
//! - [`MemoryStore`] - process-local, for tests and simulation
//! - [`IniFileStore`] - `~/.geonotify/config.ini`, keys of the form
//!   `section.key` map to INI sections

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ini::Ini;
use parking_lot::Mutex;
use thiserror::Error;

use crate::platform::BoxFuture;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// String key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<String>, StoreError>>;

    /// Durable once the returned future resolves with `Ok`.
    fn set(&self, key: &str, value: String) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Get the configuration directory path (~/.geonotify).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".geonotify")
}

/// Get the path to the config file (~/.geonotify/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate entries (e.g. to simulate a previous run).
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Synchronous read, for assertions.
    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
        let value = self.value(key);
        Box::pin(async move { Ok(value) })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'_, Result<(), StoreError>> {
        self.entries.lock().insert(key.to_string(), value);
        Box::pin(async { Ok(()) })
    }
}

/// INI-file backed store.
///
/// The whole file is held in memory and rewritten on every `set`.
pub struct IniFileStore {
    path: PathBuf,
    ini: Mutex<Ini>,
}

impl IniFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let ini = if path.exists() {
            Ini::load_from_file(&path).map_err(|e| StoreError::Parse {
                path: path.clone(),
                reason: e.to_string(),
            })?
        } else {
            Ini::new()
        };
        Ok(Self {
            path,
            ini: Mutex::new(ini),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn split_key(key: &str) -> (Option<&str>, &str) {
        match key.split_once('.') {
            Some((section, name)) => (Some(section), name),
            None => (None, key),
        }
    }

    fn write(&self, ini: &Ini) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        ini.write_to_file(&self.path)?;
        Ok(())
    }
}

impl KeyValueStore for IniFileStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
        let (section, name) = Self::split_key(key);
        let value = self
            .ini
            .lock()
            .get_from(section, name)
            .map(|v| v.to_string());
        Box::pin(async move { Ok(value) })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'_, Result<(), StoreError>> {
        let (section, name) = Self::split_key(key);
        let result = {
            let mut ini = self.ini.lock();
            let previous = ini.get_from(section, name).map(|v| v.to_string());
            ini.with_section(section).set(name, value);
            let written = self.write(&ini);
            if written.is_err() {
                // Keep memory consistent with what is on disk
                match previous {
                    Some(old) => {
                        ini.with_section(section).set(name, old);
                    }
                    None => {
                        ini.delete_from(section, name);
                    }
                }
            }
            written
        };
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get("tracking.a").await.unwrap(), None);

        store.set("tracking.a", "1".to_string()).await.unwrap();
        assert_eq!(store.get("tracking.a").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_memory_store_with_entries() {
        let store = MemoryStore::with_entries([("k", "v")]);
        assert_eq!(store.value("k"), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_ini_store_persists_across_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let store = IniFileStore::open(&path).unwrap();
        store
            .set("tracking.min_interval_ms", "7000".to_string())
            .await
            .unwrap();
        assert!(path.exists());

        let reopened = IniFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("tracking.min_interval_ms").await.unwrap(),
            Some("7000".to_string())
        );

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[tracking]"));
        assert!(content.contains("min_interval_ms=7000"));
    }

    #[tokio::test]
    async fn test_ini_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = IniFileStore::open(dir.path().join("absent.ini")).unwrap();
        assert_eq!(store.get("tracking.anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ini_store_key_without_section() {
        let dir = TempDir::new().unwrap();
        let store = IniFileStore::open(dir.path().join("config.ini")).unwrap();
        store.set("plain", "yes".to_string()).await.unwrap();
        assert_eq!(store.get("plain").await.unwrap(), Some("yes".to_string()));
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with(".geonotify/config.ini"));
    }
}
