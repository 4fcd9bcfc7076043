//! Key-value persistence
//!
//! The engine persists through a minimal get/set capability so the durable
//! backend stays swappable: a directory of JSON documents on device, an
//! in-memory map in tests and simulation.

use crate::error::EngineError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Durable string-keyed storage capability
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under a key, or None if absent
    fn get(&self, key: &str) -> Result<Option<String>, EngineError>;

    /// Replace the value stored under a key
    fn set(&self, key: &str, value: &str) -> Result<(), EngineError>;
}

/// File-backed store: one document per key under a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at a directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, EngineError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| EngineError::StorageUnavailable(format!("create {:?}: {}", dir, e)))?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EngineError::StorageUnavailable(format!(
                "read {:?}: {}",
                path, e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), EngineError> {
        let path = self.key_path(key);
        fs::write(&path, value).map_err(|e| {
            EngineError::StorageUnavailable(format!("write {:?}: {}", path, e))
        })
    }
}

/// In-memory store for tests and deviceless runs
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        Ok(self.map.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), EngineError> {
        self.map.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
