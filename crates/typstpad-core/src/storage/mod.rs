//! Persistence ports and their implementations.
//!
//! Two stores back the core:
//! - a key-value store for small JSON settings (installed fonts, formulas)
//! - an object store holding uploaded font records with their binaries
//!
//! In-memory fakes are used for tests and as the non-persistent fallback;
//! `JsonFileStore` and `SqliteFontStore` persist to disk.

mod json_file;
mod memory;
mod sqlite;
mod traits;

pub use json_file::JsonFileStore;
pub use memory::{MemoryFontStore, MemoryKeyValueStore};
pub use sqlite::SqliteFontStore;
pub use traits::{FontObjectStore, KeyValueStore};
