//! Centralized configuration for TypstPad Core.
//!
//! Storage keys, asset paths, and compile pipeline timings.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "TypstPad";
    pub const DATA_DIR_NAME: &'static str = "typstpad";
}

/// Font asset configuration.
pub struct FontConfig;

impl FontConfig {
    /// Key of the installed bundled-font selection in the key-value store.
    pub const INSTALLED_STORAGE_KEY: &'static str = "typst-fonts-installed-v1";
    /// URL prefix under which bundled fonts are served.
    pub const BUNDLED_URL_PREFIX: &'static str = "/fonts/";
    /// Family assigned when metadata extraction fails or finds nothing.
    pub const UNKNOWN_FAMILY: &'static str = "Unknown Font";
}

/// Compile pipeline configuration.
pub struct CompileConfig;

impl CompileConfig {
    /// Quiet period before a scheduled compile runs.
    pub const DEBOUNCE: Duration = Duration::from_millis(200);
    /// Page and text directives prepended to every document.
    pub const PAGE_PREAMBLE: &'static str =
        "#set page(width: auto, height: auto, margin: 0.5em)\n#set text(size: 24pt)\n";
    /// Source compiled once after instantiation to warm the compiler.
    pub const SMOKE_TEST_SOURCE: &'static str = "$ x $";
    /// Maximum number of cached symbol previews.
    pub const SYMBOL_CACHE_CAPACITY: u64 = 512;
    /// How often a compile is retried when a font refresh overtakes it.
    pub const MAX_STALE_RETRIES: u32 = 3;
}

/// Persistence file and table names.
pub struct StorageConfig;

impl StorageConfig {
    pub const SETTINGS_FILE_NAME: &'static str = "settings.json";
    pub const FONT_DB_FILE_NAME: &'static str = "typstpad-fonts.sqlite";
    /// Key of the saved formula library in the key-value store.
    pub const FORMULAS_STORAGE_KEY: &'static str = "typst-editor-formulas";
    pub const FORMULAS_VERSION: u32 = 1;
}
