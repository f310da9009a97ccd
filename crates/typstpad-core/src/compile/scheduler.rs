//! Debounced, latest-wins compile scheduling for live previews.

use super::orchestrator::CompileOrchestrator;
use super::types::{CompileOptions, CompileResult};
use crate::config::CompileConfig;
use crate::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Coalesces rapid edits into one compile and drops superseded results.
///
/// Every request takes a ticket. A request whose ticket is no longer the
/// newest when its quiet period ends, or when its compile finishes,
/// resolves to `Ok(None)` and its output is never observed.
pub struct CompileScheduler {
    orchestrator: Arc<CompileOrchestrator>,
    quiet_period: Duration,
    latest: AtomicU64,
}

impl CompileScheduler {
    pub fn new(orchestrator: Arc<CompileOrchestrator>) -> Self {
        Self::with_quiet_period(orchestrator, CompileConfig::DEBOUNCE)
    }

    pub fn with_quiet_period(
        orchestrator: Arc<CompileOrchestrator>,
        quiet_period: Duration,
    ) -> Self {
        Self {
            orchestrator,
            quiet_period,
            latest: AtomicU64::new(0),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Compile after the quiet period unless a newer request arrives first.
    pub async fn schedule(
        &self,
        text: &str,
        options: CompileOptions,
    ) -> Result<Option<CompileResult>> {
        let ticket = self.next_ticket();
        tokio::time::sleep(self.quiet_period).await;
        if !self.is_latest(ticket) {
            trace!("Debounced compile request {}", ticket);
            return Ok(None);
        }
        self.run(ticket, text, options).await
    }

    /// Compile immediately, still dropping the result if a newer request arrives.
    pub async fn submit(
        &self,
        text: &str,
        options: CompileOptions,
    ) -> Result<Option<CompileResult>> {
        let ticket = self.next_ticket();
        self.run(ticket, text, options).await
    }

    fn next_ticket(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    async fn run(
        &self,
        ticket: u64,
        text: &str,
        options: CompileOptions,
    ) -> Result<Option<CompileResult>> {
        let result = self.orchestrator.compile(text, options).await;
        if !self.is_latest(ticket) {
            trace!("Dropping output of superseded compile request {}", ticket);
            return Ok(None);
        }
        result.map(Some)
    }
}
