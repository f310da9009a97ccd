//! Typst compile pipeline.
//!
//! - `runtime`: ports to the compiler runtime (module/font fetch, instances)
//! - `orchestrator`: lazy loading, generation-scoped refresh, compiling
//! - `scheduler`: debounced latest-wins scheduling for live previews
//! - `diagnostics`: normalization of compiler failures
//! - `progress`: loading progress fan-out

mod diagnostics;
mod orchestrator;
mod progress;
mod runtime;
mod scheduler;
mod source;
mod types;

pub use diagnostics::{extract_diagnostics, parse_debug_diagnostics};
pub use orchestrator::CompileOrchestrator;
pub use progress::{ProgressHub, ProgressSubscription};
pub use runtime::{
    CompilerError, CompilerInstance, CompilerModules, CompilerRuntime, FetchProgress, ModuleKind,
};
pub use scheduler::CompileScheduler;
pub use source::{prepare_source, simplified_formula, wrap_document};
pub use types::{
    CompileOptions, CompileResult, DiagnosticInfo, LoadPhase, ProgressEvent, Severity,
};
