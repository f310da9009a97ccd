//! Generation counter for discarding stale async work.
//!
//! Every font refresh advances the shared counter. Async continuations carry
//! the [`GenerationStamp`] taken when they started and drop their effects if
//! the counter has moved on. Work is never aborted, only ignored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A shared, monotonically increasing generation counter.
///
/// Clones observe the same counter.
///
/// # Example
///
/// ```
/// use typstpad_core::generation::GenerationCounter;
///
/// let counter = GenerationCounter::new();
/// let stamp = counter.stamp();
/// assert!(stamp.is_current());
///
/// counter.advance();
/// assert!(!stamp.is_current());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    /// Create a counter starting at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current generation number.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Start a new generation and return its number.
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Capture the current generation.
    pub fn stamp(&self) -> GenerationStamp {
        GenerationStamp {
            generation: self.current(),
            counter: self.current.clone(),
        }
    }
}

/// The generation captured at the start of some async work.
#[derive(Debug, Clone)]
pub struct GenerationStamp {
    generation: u64,
    counter: Arc<AtomicU64>,
}

impl GenerationStamp {
    /// The captured generation number.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether no refresh happened since this stamp was taken.
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.generation
    }

    /// Return an error if this stamp has been superseded.
    pub fn check(&self) -> Result<(), StaleGeneration> {
        let current = self.counter.load(Ordering::SeqCst);
        if current == self.generation {
            Ok(())
        } else {
            Err(StaleGeneration {
                stamped: self.generation,
                current,
            })
        }
    }
}

/// Returned when work tagged with an old generation tries to apply effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleGeneration {
    pub stamped: u64,
    pub current: u64,
}

impl std::fmt::Display for StaleGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "generation {} superseded by {}",
            self.stamped, self.current
        )
    }
}

impl std::error::Error for StaleGeneration {}
