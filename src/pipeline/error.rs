//! Reporting of item-level failures while batches are assembled.

use crate::cache::BatchKey;
use crate::error::SynthesisError;
use std::sync::Mutex;

/// Trait for reporting per-item synthesis failures as they happen.
pub trait ErrorReporter: Send + Sync {
    /// Reports a failure encountered while assembling `batch`.
    fn report(&self, batch: &BatchKey, error: &SynthesisError);
}

/// Reporter that logs each failure as a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, batch: &BatchKey, error: &SynthesisError) {
        tracing::warn!(
            profile = %batch.profile,
            batch = batch.batch_index,
            "{error}"
        );
    }
}

/// Reporter that keeps every failure in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reports: Mutex<Vec<(BatchKey, SynthesisError)>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Failures reported so far, in arrival order.
    pub fn reports(&self) -> Vec<(BatchKey, SynthesisError)> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, batch: &BatchKey, error: &SynthesisError) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push((batch.clone(), error.clone()));
        }
    }
}
