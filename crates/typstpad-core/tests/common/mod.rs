//! Shared fakes for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use typstpad_core::compile::{
    CompilerError, CompilerInstance, CompilerModules, CompilerRuntime, FetchProgress, ModuleKind,
};
use typstpad_core::config::CompileConfig;
use typstpad_core::fonts::{FontInfo, FontMetadataExtractor};
use typstpad_core::{PadError, ProgressEvent, ProgressSubscription, Result, Workbench};

/// Debug-formatted failure the fake compiler reports for `1/0`.
pub const DIV_BY_ZERO: &str = r#"[SourceDiagnostic { severity: Error, span: Span(27), message: "div by zero", trace: [], hints: ["check `x`", "see \`docs\`"] }]"#;

#[derive(Default)]
pub struct FakeState {
    pub module_fetches: AtomicUsize,
    pub font_fetches: AtomicUsize,
    pub instantiations: AtomicUsize,
    pub fail_modules: AtomicBool,
    /// Delay in the middle of every font fetch.
    pub font_delay_ms: AtomicU64,
    /// Delay for sources containing `slow`.
    pub slow_compile_ms: AtomicU64,
    /// Every document body compiled, preamble stripped, warm-up included.
    pub compiled: Mutex<Vec<String>>,
    /// Fonts handed to the latest instance.
    pub last_fonts: Mutex<Vec<Bytes>>,
}

/// Compiler runtime that serves font URLs as their own bytes and renders
/// documents as `<svg data-fonts="N">body</svg>`.
#[derive(Clone, Default)]
pub struct FakeRuntime {
    pub state: Arc<FakeState>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instantiations(&self) -> usize {
        self.state.instantiations.load(Ordering::SeqCst)
    }

    pub fn set_font_delay(&self, delay: Duration) {
        self.state
            .font_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_slow_compile(&self, delay: Duration) {
        self.state
            .slow_compile_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_fail_modules(&self, fail: bool) {
        self.state.fail_modules.store(fail, Ordering::SeqCst);
    }

    /// Compiled bodies excluding the warm-up compile.
    pub fn compiled_bodies(&self) -> Vec<String> {
        self.state
            .compiled
            .lock()
            .unwrap()
            .iter()
            .filter(|body| body.as_str() != CompileConfig::SMOKE_TEST_SOURCE)
            .cloned()
            .collect()
    }

    pub fn last_fonts(&self) -> Vec<Bytes> {
        self.state.last_fonts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompilerRuntime for FakeRuntime {
    async fn fetch_module(&self, kind: ModuleKind) -> Result<Bytes> {
        self.state.module_fetches.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_modules.load(Ordering::SeqCst) {
            return Err(PadError::ModuleFetch {
                module: kind.to_string(),
                message: "network unreachable".into(),
            });
        }
        Ok(Bytes::from_static(b"\0asm"))
    }

    async fn fetch_font(&self, url: &str, on_progress: FetchProgress<'_>) -> Result<Bytes> {
        self.state.font_fetches.fetch_add(1, Ordering::SeqCst);
        let data = Bytes::copy_from_slice(url.as_bytes());
        let total = data.len() as u64;

        on_progress(total / 2, Some(total));
        let delay = self.state.font_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        on_progress(total, Some(total));
        Ok(data)
    }

    async fn instantiate(
        &self,
        _modules: CompilerModules,
        fonts: Vec<Bytes>,
    ) -> Result<Arc<dyn CompilerInstance>> {
        self.state.instantiations.fetch_add(1, Ordering::SeqCst);
        *self.state.last_fonts.lock().unwrap() = fonts.clone();
        Ok(Arc::new(FakeInstance {
            state: self.state.clone(),
            font_count: fonts.len(),
        }))
    }
}

struct FakeInstance {
    state: Arc<FakeState>,
    font_count: usize,
}

#[async_trait]
impl CompilerInstance for FakeInstance {
    async fn compile(&self, source: &str) -> std::result::Result<String, CompilerError> {
        let body = source
            .strip_prefix(CompileConfig::PAGE_PREAMBLE)
            .unwrap_or(source)
            .to_string();
        self.state.compiled.lock().unwrap().push(body.clone());

        if body.contains("slow") {
            let delay = self.state.slow_compile_ms.load(Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if body.contains("1/0") {
            return Err(CompilerError::Message(DIV_BY_ZERO.to_string()));
        }
        if body.contains("#structured") {
            return Err(CompilerError::Structured(serde_json::json!([
                { "severity": "warning", "message": "unused import", "hints": [] },
                { "severity": "error", "message": "unknown variable: q", "hints": ["define it first"] }
            ])));
        }
        Ok(format!("<svg data-fonts=\"{}\">{}</svg>", self.font_count, body))
    }
}

/// Family "Custom Sans" for anything not starting with `BAD`.
pub struct FakeExtractor;

#[async_trait]
impl FontMetadataExtractor for FakeExtractor {
    async fn font_info(&self, data: &[u8]) -> Result<Vec<FontInfo>> {
        if data.starts_with(b"BAD") {
            return Err(PadError::Metadata {
                message: "not a font".into(),
            });
        }
        Ok(vec![FontInfo {
            family: Some("Custom Sans".into()),
            style: Some("normal".into()),
            weight: Some(400),
        }])
    }
}

/// In-memory workbench over `runtime`.
pub fn workbench(runtime: &FakeRuntime) -> Workbench {
    Workbench::builder()
        .runtime(Arc::new(runtime.clone()))
        .metadata_extractor(Arc::new(FakeExtractor))
        .build()
        .unwrap()
}

/// On-disk workbench over `runtime`.
pub fn workbench_in(runtime: &FakeRuntime, dir: &Path) -> Workbench {
    Workbench::builder()
        .runtime(Arc::new(runtime.clone()))
        .metadata_extractor(Arc::new(FakeExtractor))
        .data_dir(dir)
        .build()
        .unwrap()
}

/// Record progress events until the subscription drops.
pub fn record_progress(
    workbench: &Workbench,
) -> (Arc<Mutex<Vec<ProgressEvent>>>, ProgressSubscription) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let subscription = workbench
        .compiler()
        .subscribe_progress(move |event| sink.lock().unwrap().push(*event));
    (events, subscription)
}
