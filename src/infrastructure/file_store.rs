// JSON-file backed key-value store
use crate::application::visibility::KeyValueStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a JSON object of strings")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// All keys live in one JSON object file, rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(io)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        // A corrupt file is replaced rather than blocking every later write.
        let mut entries = self.read_all().unwrap_or_else(|e| {
            tracing::warn!("Resetting settings store: {}", e);
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value.to_string());
        Ok(self.write_all(&entries)?)
    }
}
