//! Compiler lifecycle: lazy loading, compiling, refreshing.
//!
//! One compiler instance exists per generation. It is built on first use
//! (or on [`CompileOrchestrator::preload`]) from the font sources current at
//! that moment. [`CompileOrchestrator::refresh`] starts a new generation:
//! the old instance is dropped, in-flight loads stop emitting progress and
//! their results are discarded, and the next call rebuilds from the then
//! current fonts.

use super::diagnostics::extract_diagnostics;
use super::progress::{ProgressHub, ProgressSubscription};
use super::runtime::{CompilerInstance, CompilerModules, CompilerRuntime, ModuleKind};
use super::source::{prepare_source, wrap_document};
use super::types::{CompileOptions, CompileResult, LoadPhase, ProgressEvent};
use crate::config::CompileConfig;
use crate::error::{PadError, Result};
use crate::fonts::FontSourceProvider;
use crate::generation::{GenerationCounter, GenerationStamp};
use bytes::Bytes;
use mini_moka::sync::Cache;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Compiler state for one generation.
struct Session {
    stamp: GenerationStamp,
    instance: OnceCell<Arc<dyn CompilerInstance>>,
}

impl Session {
    fn new(stamp: GenerationStamp) -> Arc<Self> {
        Arc::new(Self {
            stamp,
            instance: OnceCell::new(),
        })
    }
}

/// Owns the compiler instance and sequences loading, compiling and refreshes.
pub struct CompileOrchestrator {
    runtime: Arc<dyn CompilerRuntime>,
    fonts: Arc<dyn FontSourceProvider>,
    generation: GenerationCounter,
    session: Mutex<Arc<Session>>,
    progress: ProgressHub,
    symbol_cache: Mutex<Cache<String, String>>,
    symbol_cache_capacity: u64,
}

impl CompileOrchestrator {
    pub fn new(runtime: Arc<dyn CompilerRuntime>, fonts: Arc<dyn FontSourceProvider>) -> Self {
        Self::with_symbol_cache_capacity(runtime, fonts, CompileConfig::SYMBOL_CACHE_CAPACITY)
    }

    pub fn with_symbol_cache_capacity(
        runtime: Arc<dyn CompilerRuntime>,
        fonts: Arc<dyn FontSourceProvider>,
        capacity: u64,
    ) -> Self {
        let generation = GenerationCounter::new();
        Self {
            runtime,
            fonts,
            session: Mutex::new(Session::new(generation.stamp())),
            progress: ProgressHub::new(generation.clone()),
            generation,
            symbol_cache: Mutex::new(Self::build_cache(capacity)),
            symbol_cache_capacity: capacity,
        }
    }

    fn build_cache(capacity: u64) -> Cache<String, String> {
        Cache::builder().max_capacity(capacity).build()
    }

    fn current_session(&self) -> Arc<Session> {
        self.session.lock().expect("session lock poisoned").clone()
    }

    /// The current generation number.
    pub fn current_generation(&self) -> u64 {
        self.generation.current()
    }

    /// Whether a compiler for the current generation is loaded.
    pub fn is_ready(&self) -> bool {
        let session = self.current_session();
        session.stamp.is_current() && session.instance.initialized()
    }

    /// The last progress event of the current generation.
    pub fn progress_snapshot(&self) -> ProgressEvent {
        self.progress.latest()
    }

    /// Receive loading progress until the returned subscription is dropped.
    pub fn subscribe_progress<F>(&self, listener: F) -> ProgressSubscription
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.progress.subscribe(listener)
    }

    /// Load the compiler for the current generation without compiling anything.
    ///
    /// Concurrent callers share one load. Calling again once loaded is a no-op.
    pub async fn preload(&self) -> Result<()> {
        self.ready_instance().await.map(|_| ())
    }

    /// Compile `text` with the current fonts.
    ///
    /// Compiler errors are returned as [`CompileResult::Failed`]. `Err` means
    /// the compiler itself could not be loaded.
    pub async fn compile(&self, text: &str, options: CompileOptions) -> Result<CompileResult> {
        let source = prepare_source(text, options);

        for attempt in 0..=CompileConfig::MAX_STALE_RETRIES {
            let (instance, stamp) = self.ready_instance().await?;
            let outcome = instance.compile(&source).await;

            if !stamp.is_current() {
                debug!(
                    "Discarding compile output from generation {} (attempt {})",
                    stamp.generation(),
                    attempt + 1
                );
                continue;
            }

            return Ok(match outcome {
                Ok(svg) => CompileResult::Success { svg },
                Err(error) => {
                    debug!("Compile failed: {}", error);
                    CompileResult::Failed {
                        diagnostics: extract_diagnostics(&error),
                    }
                }
            });
        }

        Err(PadError::Superseded {
            attempts: CompileConfig::MAX_STALE_RETRIES + 1,
        })
    }

    /// Render a symbol preview, cached per generation. `None` if it does not compile.
    pub async fn compile_symbol(&self, code: &str) -> Option<String> {
        let cache = self
            .symbol_cache
            .lock()
            .expect("cache lock poisoned")
            .clone();
        let key = code.to_string();
        if let Some(svg) = cache.get(&key) {
            return Some(svg);
        }

        let stamp = self.generation.stamp();
        match self.compile(code, CompileOptions::simplified()).await {
            Ok(CompileResult::Success { svg }) => {
                if stamp.is_current() {
                    cache.insert(key, svg.clone());
                }
                Some(svg)
            }
            Ok(CompileResult::Failed { .. }) => None,
            Err(e) => {
                debug!("Symbol preview for {:?} unavailable: {}", code, e);
                None
            }
        }
    }

    /// Discard the compiler so the next use rebuilds it with current fonts.
    pub fn refresh(&self) {
        let generation = self.generation.advance();
        *self.session.lock().expect("session lock poisoned") =
            Session::new(self.generation.stamp());
        self.progress.reset();
        *self.symbol_cache.lock().expect("cache lock poisoned") =
            Self::build_cache(self.symbol_cache_capacity);
        info!("Compiler refresh requested, now at generation {}", generation);
    }

    /// Return the loaded instance for the current generation, loading it if needed.
    async fn ready_instance(&self) -> Result<(Arc<dyn CompilerInstance>, GenerationStamp)> {
        for _ in 0..=CompileConfig::MAX_STALE_RETRIES {
            let session = self.current_session();
            let loaded = session
                .instance
                .get_or_try_init(|| self.load_instance(session.stamp.clone()))
                .await;

            if !session.stamp.is_current() {
                debug!(
                    "Compiler for generation {} superseded while loading",
                    session.stamp.generation()
                );
                continue;
            }

            return loaded.map(|instance| (instance.clone(), session.stamp.clone()));
        }

        Err(PadError::Superseded {
            attempts: CompileConfig::MAX_STALE_RETRIES + 1,
        })
    }

    async fn load_instance(&self, stamp: GenerationStamp) -> Result<Arc<dyn CompilerInstance>> {
        let generation = stamp.generation();
        info!("Loading compiler for generation {}", generation);

        self.progress
            .emit(&stamp, ProgressEvent::phase(generation, LoadPhase::LoadingCompiler));
        let compiler = self.runtime.fetch_module(ModuleKind::Compiler).await?;
        stamp.check()?;

        self.progress
            .emit(&stamp, ProgressEvent::phase(generation, LoadPhase::LoadingRenderer));
        let renderer = self.runtime.fetch_module(ModuleKind::Renderer).await?;
        stamp.check()?;

        let sources = self.fonts.current_sources().await?;
        stamp.check()?;

        self.progress
            .emit(&stamp, ProgressEvent::fonts(generation, 0, None));
        let mut fonts: Vec<Bytes> = Vec::with_capacity(sources.total_count());
        let mut loaded: u64 = 0;
        for url in &sources.urls {
            let completed = loaded;
            let on_progress = |received: u64, total: Option<u64>| {
                self.progress.emit(
                    &stamp,
                    ProgressEvent::fonts(
                        generation,
                        completed + received,
                        total.map(|total| completed + total),
                    ),
                );
            };
            let data = self.runtime.fetch_font(url, &on_progress).await?;
            stamp.check()?;
            loaded += data.len() as u64;
            fonts.push(data);
        }
        if !sources.blobs.is_empty() {
            loaded += sources.blobs.iter().map(|blob| blob.len() as u64).sum::<u64>();
            fonts.extend(sources.blobs.iter().cloned());
            self.progress
                .emit(&stamp, ProgressEvent::fonts(generation, loaded, Some(loaded)));
        }
        debug!(
            "Loaded {} fonts ({} bytes) for generation {}",
            fonts.len(),
            loaded,
            generation
        );

        self.progress
            .emit(&stamp, ProgressEvent::phase(generation, LoadPhase::Initializing));
        let instance = self
            .runtime
            .instantiate(CompilerModules { compiler, renderer }, fonts)
            .await?;
        stamp.check()?;

        if let Err(e) = instance
            .compile(&wrap_document(CompileConfig::SMOKE_TEST_SOURCE))
            .await
        {
            warn!("Compiler warm-up compile failed: {}", e);
        }
        stamp.check()?;

        self.progress
            .emit(&stamp, ProgressEvent::phase(generation, LoadPhase::Ready));
        info!("Compiler ready for generation {}", generation);
        Ok(instance)
    }
}
