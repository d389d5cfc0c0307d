//! Progress reporting for retrievals that issue many requests.

use log::{debug, info};
use std::sync::Arc;

/// Receives progress updates while a retrieval runs.
///
/// Implementations must be `Send + Sync` so a reporter can be shared
/// through an `Arc`.
pub trait ProgressReporter: Send + Sync {
    /// Called once with the number of requests the retrieval will issue.
    fn start(&self, label: &str, total: usize);

    /// Called after each request completes.
    fn advance(&self, done: usize, total: usize, url: &str);

    fn finish(&self, label: &str, rows: usize);
}

/// Reports progress through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn start(&self, label: &str, total: usize) {
        info!("Retrieving {}: {} requests", label, total);
    }

    fn advance(&self, done: usize, total: usize, url: &str) {
        debug!("[{}/{}] fetched {}", done, total, url);
    }

    fn finish(&self, label: &str, rows: usize) {
        info!("Finished {}: {} rows", label, rows);
    }
}

/// Ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn start(&self, _label: &str, _total: usize) {}
    fn advance(&self, _done: usize, _total: usize, _url: &str) {}
    fn finish(&self, _label: &str, _rows: usize) {}
}

#[must_use]
pub fn log_progress() -> Arc<dyn ProgressReporter> {
    Arc::new(LogProgress)
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressReporter> {
    Arc::new(NullProgress)
}
