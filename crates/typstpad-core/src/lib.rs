//! TypstPad Core - headless engine of the TypstPad formula editor.
//!
//! Manages the fonts available to the Typst compiler (bundled and
//! user-uploaded), owns the compiler lifecycle (lazy loading with progress,
//! generation-scoped refresh when fonts change), normalizes compiler
//! diagnostics, and keeps the saved formula library.
//!
//! The compiler itself is supplied by the host through
//! [`compile::CompilerRuntime`].
//!
//! # Example
//!
//! ```rust,ignore
//! use typstpad_core::{CompileOptions, Workbench};
//!
//! #[tokio::main]
//! async fn main() -> typstpad_core::Result<()> {
//!     let workbench = Workbench::builder()
//!         .runtime(Arc::new(MyRuntime::new()))
//!         .build()?;
//!
//!     workbench.compiler().preload().await?;
//!     let result = workbench
//!         .compiler()
//!         .compile("x^2 + y^2 = z^2", CompileOptions::simplified())
//!         .await?;
//!     println!("compiled: {}", result.is_success());
//!
//!     Ok(())
//! }
//! ```

pub mod compile;
pub mod config;
pub mod error;
pub mod export;
pub mod fonts;
pub mod formulas;
pub mod generation;
pub mod share;
pub mod storage;

mod workbench;

// Re-export commonly used types
pub use compile::{
    CompileOptions, CompileOrchestrator, CompileResult, CompileScheduler, CompilerError,
    CompilerInstance, CompilerRuntime, DiagnosticInfo, LoadPhase, ProgressEvent,
    ProgressSubscription, Severity,
};
pub use error::{PadError, Result};
pub use fonts::{
    BundledFont, FontAssetManager, FontCategory, FontSourceSet, FontUpload, UploadedFont,
};
pub use formulas::{FormulaLibrary, FormulaStorage, FormulaUpdate, SavedFormula};
pub use generation::{GenerationCounter, GenerationStamp};
pub use workbench::{Workbench, WorkbenchBuilder};
