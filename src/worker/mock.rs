use super::JobObserver;
use crate::models::ResizeJob;
use crate::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Observer that records every outcome, for tests and local harnesses.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    resized: Arc<Mutex<Vec<PathBuf>>>,
    dropped: Arc<Mutex<Vec<(PathBuf, ErrorKind)>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_resized(&self) -> Vec<PathBuf> {
        self.resized.lock().unwrap().clone()
    }

    pub fn get_dropped(&self) -> Vec<(PathBuf, ErrorKind)> {
        self.dropped.lock().unwrap().clone()
    }

    pub fn get_finished_count(&self) -> usize {
        self.resized.lock().unwrap().len() + self.dropped.lock().unwrap().len()
    }

    /// Poll until `count` jobs have finished or `timeout` passes.
    pub async fn wait_for_finished(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.get_finished_count() < count {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        true
    }
}

impl JobObserver for RecordingObserver {
    fn on_resized(&self, _job: &ResizeJob, output: &Path) {
        self.resized.lock().unwrap().push(output.to_path_buf());
    }

    fn on_dropped(&self, job: &ResizeJob, error: &Error) {
        self.dropped
            .lock()
            .unwrap()
            .push((job.source_path.clone(), error.kind()));
    }
}
