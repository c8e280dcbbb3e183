use crate::models::ResizeJob;
use crate::Error;
use std::path::Path;

/// Hook for watching what the resize worker does with each job.
///
/// The worker logs every outcome on its own; observers only get to see it.
/// Callbacks run on the worker task, so they must return quickly.
pub trait JobObserver: Send + Sync {
    fn on_resized(&self, _job: &ResizeJob, _output: &Path) {}

    fn on_dropped(&self, _job: &ResizeJob, _error: &Error) {}
}

/// Default observer: outcomes are only logged by the worker.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl JobObserver for NoopObserver {}
