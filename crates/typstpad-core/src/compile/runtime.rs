//! Ports to the compiler runtime.
//!
//! The runtime hides how compiler modules and fonts are fetched and how a
//! compiler instance is built from them (WASM in the browser, anything else
//! natively). The orchestrator only sequences these calls.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Which compiler module to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Compiler,
    Renderer,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Compiler => "compiler",
            ModuleKind::Renderer => "renderer",
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fetched compiler and renderer modules.
#[derive(Debug, Clone)]
pub struct CompilerModules {
    pub compiler: Bytes,
    pub renderer: Bytes,
}

/// A compile failure as reported by the compiler.
///
/// Compilers report either structured diagnostic records or an opaque
/// (often debug-formatted) string.
#[derive(Debug, Clone, PartialEq)]
pub enum CompilerError {
    Structured(serde_json::Value),
    Message(String),
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompilerError::Structured(value) => write!(f, "{}", value),
            CompilerError::Message(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for CompilerError {}

/// Byte progress callback: `(received, total)`.
pub type FetchProgress<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// Loads compiler assets and builds compiler instances.
#[async_trait]
pub trait CompilerRuntime: Send + Sync {
    /// Fetch one compiler module.
    async fn fetch_module(&self, kind: ModuleKind) -> Result<Bytes>;

    /// Fetch a font binary, reporting cumulative bytes as they arrive.
    async fn fetch_font(&self, url: &str, on_progress: FetchProgress<'_>) -> Result<Bytes>;

    /// Build a compiler instance with the given fonts loaded.
    async fn instantiate(
        &self,
        modules: CompilerModules,
        fonts: Vec<Bytes>,
    ) -> Result<Arc<dyn CompilerInstance>>;
}

/// A ready compiler with a fixed font set.
#[async_trait]
pub trait CompilerInstance: Send + Sync {
    /// Compile a full document to SVG.
    async fn compile(&self, source: &str) -> std::result::Result<String, CompilerError>;
}
