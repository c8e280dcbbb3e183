//! Single resize worker fed through a rendezvous hand-off
//!
//! Submitting a job waits until the worker has taken it off the hand-off,
//! not until the resize is done. While the worker is busy every other
//! submitter stays parked in `submit`, which is what throttles ingestion.
//! Which parked submitter goes next is up to the scheduler.

pub mod mock;
pub mod observer;

pub use mock::RecordingObserver;
pub use observer::{JobObserver, NoopObserver};

use crate::image::resize_job_sync;
use crate::models::{ResizeJob, ServiceConfig};
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A job waiting in the hand-off; its submitter is released by [`Handoff::accept`].
pub struct Handoff {
    job: ResizeJob,
    accepted: oneshot::Sender<()>,
}

impl Handoff {
    pub fn accept(self) -> ResizeJob {
        // The submitter may have been cancelled; the file is on disk either way.
        let _ = self.accepted.send(());
        self.job
    }
}

#[derive(Clone)]
pub struct JobSender {
    tx: mpsc::Sender<Handoff>,
}

impl JobSender {
    /// Wait until the worker accepts `job`.
    pub async fn submit(&self, job: ResizeJob) -> Result<()> {
        let (accepted, on_accept) = oneshot::channel();
        self.tx
            .send(Handoff { job, accepted })
            .await
            .map_err(|_| Error::WorkerClosed)?;
        on_accept.await.map_err(|_| Error::WorkerClosed)
    }
}

pub struct JobReceiver {
    rx: mpsc::Receiver<Handoff>,
}

impl JobReceiver {
    /// Next pending hand-off, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Handoff> {
        self.rx.recv().await
    }
}

/// Create a connected sender/receiver pair.
///
/// The channel slot holds at most one job, and that job's submitter is
/// still blocked until the receiver accepts it.
pub fn hand_off() -> (JobSender, JobReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (JobSender { tx }, JobReceiver { rx })
}

/// Busy flag of the worker. Observability only.
#[derive(Clone, Default, Debug)]
pub struct WorkerState {
    busy: Arc<AtomicBool>,
}

impl WorkerState {
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }
}

pub struct WorkerHandle {
    pub sender: JobSender,
    pub state: WorkerState,
    pub join: JoinHandle<()>,
}

pub struct ResizeWorker {
    receiver: JobReceiver,
    config: ServiceConfig,
    state: WorkerState,
    observer: Arc<dyn JobObserver>,
}

impl ResizeWorker {
    /// Start the worker on the current tokio runtime.
    pub fn spawn(config: ServiceConfig, observer: Arc<dyn JobObserver>) -> WorkerHandle {
        let (sender, receiver) = hand_off();
        let state = WorkerState::default();

        let worker = Self {
            receiver,
            config,
            state: state.clone(),
            observer,
        };
        let join = tokio::spawn(worker.run());

        WorkerHandle {
            sender,
            state,
            join,
        }
    }

    async fn run(mut self) {
        info!(
            "Resize worker started ({}x{} into {})",
            self.config.width,
            self.config.height,
            self.config.resized_dir.display()
        );

        while let Some(handoff) = self.receiver.recv().await {
            self.state.set_busy(true);
            let job = handoff.accept();
            debug!("Accepted resize job for {}", job.source_path.display());

            match self.resize(&job).await {
                Ok(output) => {
                    info!(
                        "Resized {} -> {}",
                        job.source_path.display(),
                        output.display()
                    );
                    self.observer.on_resized(&job, &output);
                }
                Err(e) => {
                    error!(
                        "Dropping resize job for {}: {}",
                        job.source_path.display(),
                        e
                    );
                    self.observer.on_dropped(&job, &e);
                }
            }

            self.state.set_busy(false);
        }

        info!("Resize worker stopped: no more senders");
    }

    async fn resize(&self, job: &ResizeJob) -> Result<PathBuf> {
        let task = tokio::task::spawn_blocking({
            let job = job.clone();
            let width = self.config.width;
            let height = self.config.height;
            let resized_dir = self.config.resized_dir.clone();
            move || resize_job_sync(&job, width, height, &resized_dir)
        });

        // A timed-out resize keeps running on its blocking thread; only the
        // worker stops waiting for it.
        let joined = match self.config.resize_timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| Error::ResizeTimeout(limit))?,
            None => task.await,
        };

        joined.map_err(|e| Error::TaskJoin(format!("Resize task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    struct TestDirs {
        originals: TempDir,
        resized: TempDir,
    }

    impl TestDirs {
        fn new() -> Self {
            Self {
                originals: TempDir::new().unwrap(),
                resized: TempDir::new().unwrap(),
            }
        }

        fn config(&self) -> ServiceConfig {
            ServiceConfig::new(6, 4, self.originals.path(), self.resized.path())
        }

        fn write_png(&self, name: &str) -> PathBuf {
            let path = self.originals.path().join(name);
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(12, 12, image::Rgba([9, 9, 9, 255])))
                .save_with_format(&path, ImageFormat::Png)
                .unwrap();
            path
        }
    }

    #[tokio::test]
    async fn test_submit_waits_for_accept() {
        let (sender, mut receiver) = hand_off();
        let job = ResizeJob::new(PathBuf::from("/tmp/a.png"), "png");

        let submit = tokio::spawn({
            let sender = sender.clone();
            let job = job.clone();
            async move { sender.submit(job).await }
        });

        // The job fits in the channel slot, but nobody has accepted it yet.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!submit.is_finished());

        let handoff = receiver.recv().await.unwrap();
        assert!(!submit.is_finished());
        assert_eq!(handoff.accept(), job);

        submit.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_submit_fails_when_worker_gone() {
        let (sender, receiver) = hand_off();
        drop(receiver);

        let result = sender
            .submit(ResizeJob::new(PathBuf::from("/tmp/a.png"), "png"))
            .await;
        assert!(matches!(result, Err(Error::WorkerClosed)));
    }

    #[tokio::test]
    async fn test_worker_resizes_job() {
        let dirs = TestDirs::new();
        let observer = RecordingObserver::new();
        let handle = ResizeWorker::spawn(dirs.config(), Arc::new(observer.clone()));

        let source = dirs.write_png("cat.png");
        handle
            .sender
            .submit(ResizeJob::new(source, "png"))
            .await
            .unwrap();

        assert!(observer.wait_for_finished(1, Duration::from_secs(5)).await);
        let output = dirs.resized.path().join("cat.png");
        assert_eq!(observer.get_resized(), vec![output.clone()]);

        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (6, 4));
    }

    #[tokio::test]
    async fn test_worker_drops_bad_jobs_and_keeps_going() {
        let dirs = TestDirs::new();
        let observer = RecordingObserver::new();
        let handle = ResizeWorker::spawn(dirs.config(), Arc::new(observer.clone()));

        let corrupt = dirs.originals.path().join("broken.png");
        std::fs::write(&corrupt, b"not a png").unwrap();
        let unknown = dirs.write_png("odd.xyz");
        let good = dirs.write_png("good.png");

        for job in [
            ResizeJob::new(corrupt.clone(), "png"),
            ResizeJob::new(unknown.clone(), "xyz"),
            ResizeJob::new(good, "png"),
        ] {
            handle.sender.submit(job).await.unwrap();
        }

        assert!(observer.wait_for_finished(3, Duration::from_secs(5)).await);
        assert_eq!(
            observer.get_dropped(),
            vec![
                (corrupt, ErrorKind::Decode),
                (unknown, ErrorKind::Validation)
            ]
        );
        assert!(dirs.resized.path().join("good.png").exists());
        assert!(!dirs.resized.path().join("broken.png").exists());
    }

    #[tokio::test]
    async fn test_worker_idle_after_draining() {
        let dirs = TestDirs::new();
        let observer = RecordingObserver::new();
        let handle = ResizeWorker::spawn(dirs.config(), Arc::new(observer.clone()));
        assert!(!handle.state.is_busy());

        let source = dirs.write_png("dog.png");
        handle
            .sender
            .submit(ResizeJob::new(source, "png"))
            .await
            .unwrap();

        assert!(observer.wait_for_finished(1, Duration::from_secs(5)).await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.state.is_busy());
    }

    #[tokio::test]
    async fn test_worker_stops_when_senders_dropped() {
        let dirs = TestDirs::new();
        let handle = ResizeWorker::spawn(dirs.config(), Arc::new(NoopObserver));

        drop(handle.sender);
        tokio::time::timeout(Duration::from_secs(5), handle.join)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_resize_timeout_drops_job_and_keeps_serving() {
        let dirs = TestDirs::new();
        let observer = RecordingObserver::new();
        let config = ServiceConfig::new(1200, 1200, dirs.originals.path(), dirs.resized.path())
            .with_resize_timeout(Duration::from_millis(1));
        let handle = ResizeWorker::spawn(config, Arc::new(observer.clone()));

        let big = dirs.originals.path().join("big.png");
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(1500, 1500, image::Rgba([1, 2, 3, 255])))
            .save_with_format(&big, ImageFormat::Png)
            .unwrap();

        handle
            .sender
            .submit(ResizeJob::new(big.clone(), "png"))
            .await
            .unwrap();

        assert!(observer.wait_for_finished(1, Duration::from_secs(5)).await);
        assert_eq!(observer.get_dropped(), vec![(big, ErrorKind::Worker)]);
    }

    #[tokio::test]
    async fn test_missing_source_is_dropped() {
        let dirs = TestDirs::new();
        let observer = RecordingObserver::new();
        let handle = ResizeWorker::spawn(dirs.config(), Arc::new(observer.clone()));

        let missing = Path::new("/definitely/not/here.png").to_path_buf();
        handle
            .sender
            .submit(ResizeJob::new(missing.clone(), "png"))
            .await
            .unwrap();

        assert!(observer.wait_for_finished(1, Duration::from_secs(5)).await);
        assert_eq!(observer.get_dropped(), vec![(missing, ErrorKind::Io)]);
    }
}
