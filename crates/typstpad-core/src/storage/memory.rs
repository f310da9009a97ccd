//! In-memory stores.
//!
//! Both stores can be told to fail reads or writes, which is how tests
//! exercise the degrade-to-memory paths of the managers.

use super::traits::{FontObjectStore, KeyValueStore};
use crate::error::{PadError, Result};
use crate::fonts::UploadedFont;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Key-value store held in memory.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set`/`remove` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Read a value directly, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("kv store lock poisoned")
            .get(key)
            .cloned()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PadError::storage(format!("read of '{}' rejected", key)));
        }
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PadError::storage(format!("quota exceeded writing '{}'", key)));
        }
        self.entries
            .lock()
            .expect("kv store lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PadError::storage(format!("removal of '{}' rejected", key)));
        }
        self.entries
            .lock()
            .expect("kv store lock poisoned")
            .remove(key);
        Ok(())
    }
}

/// Font object store held in memory.
#[derive(Debug, Default)]
pub struct MemoryFontStore {
    records: Mutex<BTreeMap<String, UploadedFont>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryFontStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with records, bypassing failure injection.
    pub fn with_records(records: impl IntoIterator<Item = UploadedFont>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.lock().expect("font store lock poisoned");
            for record in records {
                map.insert(record.id.clone(), record);
            }
        }
        store
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().expect("font store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PadError::storage("font database unavailable"));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PadError::storage("font database is read-only"));
        }
        Ok(())
    }
}

#[async_trait]
impl FontObjectStore for MemoryFontStore {
    async fn get(&self, id: &str) -> Result<Option<UploadedFont>> {
        self.check_read()?;
        Ok(self
            .records
            .lock()
            .expect("font store lock poisoned")
            .get(id)
            .cloned())
    }

    async fn put(&self, font: &UploadedFont) -> Result<()> {
        self.check_write()?;
        self.records
            .lock()
            .expect("font store lock poisoned")
            .insert(font.id.clone(), font.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check_write()?;
        self.records
            .lock()
            .expect("font store lock poisoned")
            .remove(id);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<UploadedFont>> {
        self.check_read()?;
        Ok(self
            .records
            .lock()
            .expect("font store lock poisoned")
            .values()
            .cloned()
            .collect())
    }
}
