//! JSON-file backed key-value store.
//!
//! All keys live in a single JSON object. Writes go to a temp file in the
//! same directory, are fsynced, and are renamed over the target so a crash
//! never leaves a half-written settings file.

use super::traits::KeyValueStore;
use crate::error::{PadError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Key-value store persisted to one JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents =
            fs::read_to_string(&self.path).map_err(|e| PadError::io_with_path(e, &self.path))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|e| PadError::Json {
            message: format!("Failed to parse {}: {}", self.path.display(), e),
            source: Some(e),
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| PadError::io_with_path(e, &parent))?;

        let serialized = serde_json::to_string_pretty(map)?;
        let mut temp =
            NamedTempFile::new_in(&parent).map_err(|e| PadError::io_with_path(e, &parent))?;
        temp.write_all(serialized.as_bytes())
            .map_err(|e| PadError::io_with_path(e, temp.path()))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| PadError::io_with_path(e, temp.path()))?;
        temp.persist(&self.path)
            .map_err(|e| PadError::io_with_path(e.error, &self.path))?;

        debug!("Wrote {} settings to {}", map.len(), self.path.display());
        Ok(())
    }

    /// Read the map for modification, starting over if the file is corrupt.
    fn read_map_for_update(&self) -> Result<BTreeMap<String, String>> {
        match self.read_map() {
            Ok(map) => Ok(map),
            Err(PadError::Json { message, .. }) => {
                warn!("Discarding corrupt settings file: {}", message);
                Ok(BTreeMap::new())
            }
            Err(e) => Err(e),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| PadError::storage(format!("settings lock poisoned: {}", e)))?;
        let mut map = self.read_map_for_update()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| PadError::storage(format!("settings lock poisoned: {}", e)))?;
        let mut map = self.read_map_for_update()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}
