//! Error types for TypstPad Core.
//!
//! Compiler diagnostics are not errors: they are returned as data inside
//! [`CompileResult`](crate::compile::CompileResult). The variants here cover
//! asset loading, storage and input failures.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the TypstPad core library.
#[derive(Debug, Error)]
pub enum PadError {
    // Asset loading errors
    #[error("Failed to fetch {module} module: {message}")]
    ModuleFetch { module: String, message: String },

    #[error("Failed to fetch font {url}: {message}")]
    FontFetch { url: String, message: String },

    #[error("Compiler initialization failed: {message}")]
    Instantiate { message: String },

    // Storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Font errors
    #[error("Failed to read font metadata: {message}")]
    Metadata { message: String },

    // Compile pipeline errors
    #[error("Compile superseded after {attempts} font refreshes")]
    Superseded { attempts: u32 },

    #[error("Work for generation {stamped} abandoned (current is {current})")]
    StaleGeneration { stamped: u64, current: u64 },

    // Validation errors
    #[error("Invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for TypstPad operations.
pub type Result<T> = std::result::Result<T, PadError>;

impl From<std::io::Error> for PadError {
    fn from(err: std::io::Error) -> Self {
        PadError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for PadError {
    fn from(err: serde_json::Error) -> Self {
        PadError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for PadError {
    fn from(err: rusqlite::Error) -> Self {
        PadError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<crate::generation::StaleGeneration> for PadError {
    fn from(err: crate::generation::StaleGeneration) -> Self {
        PadError::StaleGeneration {
            stamped: err.stamped,
            current: err.current,
        }
    }
}

impl PadError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        PadError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a storage error from any displayable cause.
    pub fn storage(message: impl Into<String>) -> Self {
        PadError::Storage {
            message: message.into(),
        }
    }

    /// Whether this error came from loading compiler modules or fonts.
    ///
    /// Asset failures leave the preview unavailable but the document
    /// editable; callers show a generic failure state for them.
    pub fn is_asset_failure(&self) -> bool {
        matches!(
            self,
            PadError::ModuleFetch { .. } | PadError::FontFetch { .. } | PadError::Instantiate { .. }
        )
    }

    /// Whether this error came from a persistence backend.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            PadError::Storage { .. }
                | PadError::Database { .. }
                | PadError::Io { .. }
                | PadError::Json { .. }
        )
    }
}
