//! Storage port traits.

use crate::error::Result;
use crate::fonts::UploadedFont;
use async_trait::async_trait;

/// String key-value storage for settings.
///
/// Mirrors browser local storage: synchronous, small values, may fail on
/// quota or when persistence is disabled. Callers decide whether failures
/// are fatal; the font and formula managers swallow them.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Object store for uploaded font records, keyed by font id.
#[async_trait]
pub trait FontObjectStore: Send + Sync {
    /// Fetch one record.
    async fn get(&self, id: &str) -> Result<Option<UploadedFont>>;

    /// Insert or replace a record.
    async fn put(&self, font: &UploadedFont) -> Result<()>;

    /// Delete a record. Deleting a missing id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Fetch every record, in no particular order.
    async fn get_all(&self) -> Result<Vec<UploadedFont>>;
}
