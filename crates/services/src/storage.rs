//! On-device key/value store.
//!
//! Each key is one pretty-printed JSON document (`<key>.json`) in the data
//! directory. Writes replace the whole document (last write wins). A document
//! that no longer parses is logged and removed so the caller starts fresh.

use directories::ProjectDirs;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode value for {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

pub struct KvStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl KvStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Platform data directory, e.g. `~/.local/share/focustube` on Linux.
    pub fn default_dir() -> PathBuf {
        ProjectDirs::from("com.local", "FocusTube", "FocusTube")
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./focustube-data"))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.path_for(key)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("clearing corrupt storage entry {}: {}", key, e);
                remove_file(&path)?;
                Ok(None)
            }
        }
    }

    /// Like `get`, but I/O problems are logged and read as "nothing stored".
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.get(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!("failed to read {}: {}", key, e);
                T::default()
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        self.write(key, value)
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("stored {}", key);
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let path = self.path_for(key)?;
        remove_file(&path)
    }

    /// Read-modify-write of one key. Missing or corrupt values start from `T::default()`.
    pub fn update<T, F, R>(&self, key: &str, f: F) -> Result<R, StoreError>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.write_lock.lock();
        let mut value: T = self.get(key)?.unwrap_or_default();
        let result = f(&mut value);
        self.write(key, &value)?;
        Ok(result)
    }

    /// Keys currently stored that start with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut keys: Vec<String> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                name.strip_suffix(".json").map(|k| k.to_string())
            })
            .filter(|k| k.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

fn remove_file(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
