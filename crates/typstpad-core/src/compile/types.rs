//! Compile pipeline data types.

use serde::{Deserialize, Serialize};

/// Severity of a compiler diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Anything other than "warning" (case-insensitive) counts as an error.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(token) if token.eq_ignore_ascii_case("warning") => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// One compiler diagnostic in the uniform shape the editor renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticInfo {
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub hints: Vec<String>,
}

impl DiagnosticInfo {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            hints: Vec::new(),
        }
    }
}

/// Outcome of compiling a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompileResult {
    /// The document compiled to SVG.
    Success { svg: String },
    /// The compiler rejected the document.
    Failed { diagnostics: Vec<DiagnosticInfo> },
}

impl CompileResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CompileResult::Success { .. })
    }

    pub fn svg(&self) -> Option<&str> {
        match self {
            CompileResult::Success { svg } => Some(svg),
            CompileResult::Failed { .. } => None,
        }
    }

    pub fn diagnostics(&self) -> &[DiagnosticInfo] {
        match self {
            CompileResult::Success { .. } => &[],
            CompileResult::Failed { diagnostics } => diagnostics,
        }
    }
}

/// Per-request compile options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    /// Treat the whole document as one math expression.
    #[serde(default)]
    pub simplified_formula_mode: bool,
}

impl CompileOptions {
    pub fn simplified() -> Self {
        Self {
            simplified_formula_mode: true,
        }
    }
}

/// Loading phase of the compiler for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    Uninitialized,
    LoadingCompiler,
    LoadingRenderer,
    LoadingFonts,
    Initializing,
    Ready,
}

/// A progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub generation: u64,
    pub phase: LoadPhase,
    /// Bytes received so far (font loading only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded: Option<u64>,
    /// Bytes expected, when known (font loading only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl ProgressEvent {
    pub fn phase(generation: u64, phase: LoadPhase) -> Self {
        Self {
            generation,
            phase,
            loaded: None,
            total: None,
        }
    }

    pub fn fonts(generation: u64, loaded: u64, total: Option<u64>) -> Self {
        Self {
            generation,
            phase: LoadPhase::LoadingFonts,
            loaded: Some(loaded),
            total,
        }
    }
}
