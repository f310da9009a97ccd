//! The editor core: fonts, compiler and formula library wired together.

use crate::compile::{CompileOrchestrator, CompileScheduler, CompilerRuntime};
use crate::config::{CompileConfig, StorageConfig};
use crate::error::{PadError, Result};
use crate::fonts::{
    FontAssetManager, FontMetadataExtractor, FontUpload, OpenTypeExtractor, UploadedFont,
};
use crate::formulas::FormulaLibrary;
use crate::storage::{
    FontObjectStore, JsonFileStore, KeyValueStore, MemoryFontStore, MemoryKeyValueStore,
    SqliteFontStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Font management, compiling and the formula library over shared stores.
///
/// Font changes made through the workbench refresh the compiler, so the
/// next compile picks up the new font set.
pub struct Workbench {
    fonts: Arc<FontAssetManager>,
    compiler: Arc<CompileOrchestrator>,
    formulas: FormulaLibrary,
    debounce: Duration,
}

impl Workbench {
    /// Start configuring a workbench. A compiler runtime is required.
    pub fn builder() -> WorkbenchBuilder {
        WorkbenchBuilder::new()
    }

    pub fn fonts(&self) -> &Arc<FontAssetManager> {
        &self.fonts
    }

    pub fn compiler(&self) -> &Arc<CompileOrchestrator> {
        &self.compiler
    }

    pub fn formulas(&self) -> &FormulaLibrary {
        &self.formulas
    }

    /// A debounced scheduler for one live preview.
    pub fn scheduler(&self) -> CompileScheduler {
        CompileScheduler::with_quiet_period(self.compiler.clone(), self.debounce)
    }

    /// Replace the installed bundled fonts and refresh the compiler.
    pub async fn apply_bundled_selection<S: AsRef<str>>(&self, ids: &[S]) -> Vec<String> {
        let installed = self.fonts.set_installed_bundled_ids(ids).await;
        self.compiler.refresh();
        installed
    }

    /// Add uploaded fonts and refresh the compiler if any were new.
    pub async fn upload_fonts(&self, uploads: Vec<FontUpload>) -> Result<Vec<UploadedFont>> {
        let added = self.fonts.add_uploaded_fonts(uploads).await?;
        if !added.is_empty() {
            self.compiler.refresh();
        }
        Ok(added)
    }

    /// Remove an uploaded font and refresh the compiler.
    pub async fn remove_uploaded_font(&self, id: &str) {
        self.fonts.remove_uploaded_font(id).await;
        self.compiler.refresh();
    }
}

/// Builder for [`Workbench`].
///
/// Stores default to in-memory ones; [`WorkbenchBuilder::data_dir`] switches
/// to on-disk stores.
///
/// # Example
///
/// ```rust,ignore
/// let workbench = Workbench::builder()
///     .runtime(Arc::new(MyRuntime::new()))
///     .data_dir("/home/me/.local/share/typstpad")
///     .build()?;
/// ```
pub struct WorkbenchBuilder {
    runtime: Option<Arc<dyn CompilerRuntime>>,
    data_dir: Option<PathBuf>,
    settings: Option<Arc<dyn KeyValueStore>>,
    font_store: Option<Arc<dyn FontObjectStore>>,
    extractor: Option<Arc<dyn FontMetadataExtractor>>,
    debounce: Duration,
    symbol_cache_capacity: u64,
}

impl Default for WorkbenchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbenchBuilder {
    pub fn new() -> Self {
        Self {
            runtime: None,
            data_dir: None,
            settings: None,
            font_store: None,
            extractor: None,
            debounce: CompileConfig::DEBOUNCE,
            symbol_cache_capacity: CompileConfig::SYMBOL_CACHE_CAPACITY,
        }
    }

    /// The compiler runtime used to load and run the compiler.
    pub fn runtime(mut self, runtime: Arc<dyn CompilerRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Persist settings and uploaded fonts under `dir`.
    ///
    /// Explicit stores set with [`Self::settings_store`] or
    /// [`Self::font_store`] take precedence.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.settings = Some(store);
        self
    }

    pub fn font_store(mut self, store: Arc<dyn FontObjectStore>) -> Self {
        self.font_store = Some(store);
        self
    }

    /// Default: [`OpenTypeExtractor`].
    pub fn metadata_extractor(mut self, extractor: Arc<dyn FontMetadataExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Quiet period of schedulers created by [`Workbench::scheduler`].
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn symbol_cache_capacity(mut self, capacity: u64) -> Self {
        self.symbol_cache_capacity = capacity;
        self
    }

    fn create_data_dir(dir: &Path) -> Result<()> {
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| PadError::Io {
                message: format!("Failed to create data directory: {}", dir.display()),
                path: Some(dir.to_path_buf()),
                source: Some(e),
            })?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<Workbench> {
        let runtime = self.runtime.ok_or_else(|| PadError::InvalidInput {
            field: "runtime".to_string(),
            message: "a compiler runtime is required".to_string(),
        })?;

        if let Some(dir) = &self.data_dir {
            Self::create_data_dir(dir)?;
        }

        let settings: Arc<dyn KeyValueStore> = match (self.settings, &self.data_dir) {
            (Some(store), _) => store,
            (None, Some(dir)) => Arc::new(JsonFileStore::new(
                dir.join(StorageConfig::SETTINGS_FILE_NAME),
            )),
            (None, None) => Arc::new(MemoryKeyValueStore::new()),
        };
        let font_store: Arc<dyn FontObjectStore> = match (self.font_store, &self.data_dir) {
            (Some(store), _) => store,
            (None, Some(dir)) => Arc::new(SqliteFontStore::open(
                dir.join(StorageConfig::FONT_DB_FILE_NAME),
            )?),
            (None, None) => Arc::new(MemoryFontStore::new()),
        };
        let extractor = self
            .extractor
            .unwrap_or_else(|| Arc::new(OpenTypeExtractor::new()));

        let fonts = Arc::new(FontAssetManager::new(settings.clone(), font_store, extractor));
        let compiler = Arc::new(CompileOrchestrator::with_symbol_cache_capacity(
            runtime,
            fonts.clone(),
            self.symbol_cache_capacity,
        ));

        info!(
            "Workbench ready ({})",
            match &self.data_dir {
                Some(dir) => dir.display().to_string(),
                None => "in-memory".to_string(),
            }
        );

        Ok(Workbench {
            fonts,
            compiler,
            formulas: FormulaLibrary::new(settings),
            debounce: self.debounce,
        })
    }
}
