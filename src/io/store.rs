use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::io::recovery::atomic_write;

/// Error type for key-value storage
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {key}: {source}")]
    Read { key: String, source: std::io::Error },
    #[error("could not write {key}: {source}")]
    Write { key: String, source: std::io::Error },
    #[error("could not serialize {key}: {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },
}

/// String values addressed by key, the persistence seam for collections.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Remove a key. Returns whether it existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
    /// All keys currently present, sorted
    fn keys(&self) -> Result<Vec<String>, StoreError>;
    /// Keep a copy of an unreadable value next to the original
    fn backup(&self, key: &str, raw: &str) -> Result<(), StoreError>;
    /// Directory for the recovery log, if the store lives on disk
    fn recovery_dir(&self) -> Option<&Path> {
        None
    }
}

/// One `<key>.json` file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        atomic_write(&self.path_for(key), value.as_bytes()).map_err(|source| StoreError::Write {
            key: key.to_string(),
            source,
        })?;
        tracing::debug!(key, bytes = value.len(), "wrote collection file");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Write {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    key: self.dir.display().to_string(),
                    source,
                });
            }
        };
        let mut keys: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| crate::io::watcher::key_for_path(&self.dir, &entry.path()))
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn backup(&self, key: &str, raw: &str) -> Result<(), StoreError> {
        let path = self.dir.join(format!("{}.json.bak", key));
        atomic_write(&path, raw.as_bytes()).map_err(|source| StoreError::Write {
            key: key.to_string(),
            source,
        })
    }

    fn recovery_dir(&self) -> Option<&Path> {
        Some(&self.dir)
    }
}

/// In-process store, used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> R) -> R {
        let mut guard = self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.with(|m| m.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.with(|m| m.insert(key.to_string(), value.to_string()));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.with(|m| m.remove(key).is_some()))
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.with(|m| m.keys().filter(|k| !k.ends_with(".bak")).cloned().collect()))
    }

    fn backup(&self, key: &str, raw: &str) -> Result<(), StoreError> {
        self.with(|m| m.insert(format!("{}.bak", key), raw.to_string()));
        Ok(())
    }
}
