//! Pipeline coordinator: frame intake, estimator worker, smoothing and
//! publication.
//!
//! One coordinator runs per video-producing participant. Two cooperative
//! activities run while the pipeline is up:
//!
//! - the intake task drains the frame stream into a single-slot holder,
//!   unconditionally overwriting whatever is there - under load the
//!   pipeline drops frames instead of queueing them;
//! - the process loop takes the latest frame, hands it to a dedicated
//!   worker thread that owns the (stateful, strictly sequential) estimator,
//!   smooths the resulting angles and commits them to the whiteboard,
//!   publishing raw landmarks to the observer channel at most once per
//!   publish interval.
//!
//! Cancellation is cooperative: both tasks observe the running flag between
//! frames, and the estimator is released exactly once on the worker thread
//! when its job channel disconnects, even if a call was in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::pose::estimator::{EstimatorError, PoseEstimator};
use crate::publish::LandmarkPublisher;
use crate::state::{ArmAngles, MetricsUpdate, SharedBodyState};
use crate::stats::{SessionStats, SharedSessionStats, StatsSnapshot};
use crate::vision::frame::{FrameReceiver, VideoFrame};
use crate::vision::processor::{FrameOutcome, FrameProcessor};
use crate::vision::smoothing::{SmoothingWindow, DEFAULT_WINDOW};

/// Tuning knobs for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Capacity of each angle smoothing window.
    pub smoothing_window: usize,
    /// How long the process loop sleeps when no frame is pending.
    pub idle_poll: Duration,
    /// Minimum spacing between landmark publications.
    pub publish_interval: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_WINDOW,
            idle_poll: Duration::from_millis(50),
            publish_interval: Duration::from_millis(100),
        }
    }
}

/// Pipeline startup and runtime failures.
#[derive(Debug)]
pub enum PipelineError {
    /// The estimator could not be constructed. Fatal for `start`.
    Estimator(EstimatorError),
    /// The worker thread could not be spawned.
    WorkerSpawn(String),
    /// The worker thread is gone.
    WorkerUnavailable,
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Estimator(e) => write!(f, "estimator: {e}"),
            PipelineError::WorkerSpawn(e) => write!(f, "worker spawn failed: {e}"),
            PipelineError::WorkerUnavailable => write!(f, "estimator worker unavailable"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<EstimatorError> for PipelineError {
    fn from(e: EstimatorError) -> Self {
        PipelineError::Estimator(e)
    }
}

struct Job {
    frame: VideoFrame,
    reply: oneshot::Sender<Result<FrameOutcome, EstimatorError>>,
}

/// Dedicated thread owning the estimator. Jobs go in over a bounded
/// channel; results come back per-job over a oneshot. Dropping the job
/// sender ends the thread, which releases the estimator on its way out.
struct EstimatorWorker {
    job_tx: Option<crossbeam_channel::Sender<Job>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl EstimatorWorker {
    /// Construct the estimator on the worker thread and wait for the
    /// result, so `!Send` estimators work and construction failures
    /// surface to the caller.
    async fn spawn<F>(factory: F) -> Result<Self, PipelineError>
    where
        F: FnOnce() -> Result<Box<dyn PoseEstimator>, EstimatorError> + Send + 'static,
    {
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), EstimatorError>>();
        let (job_tx, job_rx) = crossbeam_channel::bounded::<Job>(1);

        let handle = thread::Builder::new()
            .name("pose-estimator".to_string())
            .spawn(move || {
                let estimator = match factory() {
                    Ok(estimator) => {
                        let _ = ready_tx.send(Ok(()));
                        estimator
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let mut processor = FrameProcessor::new(estimator);
                while let Ok(job) = job_rx.recv() {
                    let result = processor.process(&job.frame);
                    let _ = job.reply.send(result);
                }
                // Job channel disconnected: release the model exactly once.
                processor.close();
                debug!("estimator worker stopped");
            })
            .map_err(|e| PipelineError::WorkerSpawn(e.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(Self {
                job_tx: Some(job_tx),
                handle: Some(handle),
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(PipelineError::Estimator(e))
            }
            Err(_) => Err(PipelineError::WorkerUnavailable),
        }
    }

    /// Run one frame through the worker. Suspends until the (potentially
    /// slow) estimator call completes; no timeout is imposed.
    async fn process(&self, frame: VideoFrame) -> Result<FrameOutcome, PipelineError> {
        let job_tx = self.job_tx.as_ref().ok_or(PipelineError::WorkerUnavailable)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        job_tx
            .send(Job {
                frame,
                reply: reply_tx,
            })
            .map_err(|_| PipelineError::WorkerUnavailable)?;

        match reply_rx.await {
            Ok(result) => result.map_err(PipelineError::Estimator),
            Err(_) => Err(PipelineError::WorkerUnavailable),
        }
    }

    /// Disconnect the job channel and join the thread off the runtime.
    async fn shutdown(&mut self) {
        self.job_tx.take();
        if let Some(handle) = self.handle.take() {
            let joined = tokio::task::spawn_blocking(move || handle.join()).await;
            match joined {
                Ok(Ok(())) => {}
                _ => warn!("estimator worker did not shut down cleanly"),
            }
        }
    }
}

/// A running vision pipeline for one session.
pub struct VisionPipeline {
    session_id: Uuid,
    running: Arc<AtomicBool>,
    cancel: Arc<Notify>,
    intake: Option<JoinHandle<()>>,
    process: Option<JoinHandle<()>>,
    stats: SharedSessionStats,
}

impl VisionPipeline {
    /// Start intake and processing for one frame stream.
    ///
    /// `factory` builds the estimator on the worker thread; a construction
    /// failure aborts the start and is returned to the caller. The
    /// pipeline runs until the frame stream ends or [`cancel`] /
    /// [`close`] is called.
    ///
    /// [`cancel`]: VisionPipeline::cancel
    /// [`close`]: VisionPipeline::close
    pub async fn start<F>(
        factory: F,
        frames: FrameReceiver,
        state: SharedBodyState,
        publisher: Box<dyn LandmarkPublisher>,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError>
    where
        F: FnOnce() -> Result<Box<dyn PoseEstimator>, EstimatorError> + Send + 'static,
    {
        let worker = EstimatorWorker::spawn(factory).await?;

        let session_id = Uuid::new_v4();
        let running = Arc::new(AtomicBool::new(true));
        let cancel = Arc::new(Notify::new());
        let latest: Arc<Mutex<Option<VideoFrame>>> = Arc::new(Mutex::new(None));
        let stats: SharedSessionStats = Arc::new(SessionStats::new());

        let intake = tokio::spawn(intake_loop(
            frames,
            Arc::clone(&latest),
            Arc::clone(&running),
            Arc::clone(&cancel),
            Arc::clone(&stats),
        ));
        let process = tokio::spawn(process_loop(
            worker,
            latest,
            Arc::clone(&running),
            state,
            publisher,
            options,
            Arc::clone(&stats),
        ));

        info!(%session_id, "vision pipeline started");
        Ok(Self {
            session_id,
            running,
            cancel,
            intake: Some(intake),
            process: Some(process),
            stats,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Request a cooperative stop. Returns immediately; both tasks observe
    /// the flag between frames.
    pub fn cancel(&self) {
        self.running.store(false, Ordering::Release);
        // notify_one stores a permit, so the intake task wakes even if it
        // was not parked at the moment of cancellation.
        self.cancel.notify_one();
    }

    /// Stop the pipeline and wait for teardown. Idempotent: closing an
    /// already-closed pipeline is a no-op.
    pub async fn close(&mut self) {
        self.cancel();
        if let Some(intake) = self.intake.take() {
            if intake.await.is_err() {
                warn!("frame intake task panicked");
            }
        }
        if let Some(process) = self.process.take() {
            if process.await.is_err() {
                warn!("process task panicked");
            }
        }
        info!(session_id = %self.session_id, "vision pipeline closed");
    }
}

/// Holds at most one active pipeline per session. Starting a replacement
/// closes the predecessor first; the estimator and the latest-frame slot
/// are not safe to share across overlapping instances.
#[derive(Default)]
pub struct PipelineSlot {
    current: Option<VisionPipeline>,
}

impl PipelineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new pipeline, closing any predecessor.
    pub async fn replace(&mut self, next: VisionPipeline) {
        if let Some(mut previous) = self.current.take() {
            previous.close().await;
        }
        self.current = Some(next);
    }

    /// Close and drop the active pipeline, if any.
    pub async fn close(&mut self) {
        if let Some(mut pipeline) = self.current.take() {
            pipeline.close().await;
        }
    }

    pub fn get(&self) -> Option<&VisionPipeline> {
        self.current.as_ref()
    }
}

async fn intake_loop(
    mut frames: FrameReceiver,
    latest: Arc<Mutex<Option<VideoFrame>>>,
    running: Arc<AtomicBool>,
    cancel: Arc<Notify>,
    stats: SharedSessionStats,
) {
    while running.load(Ordering::Acquire) {
        let frame = tokio::select! {
            _ = cancel.notified() => break,
            frame = frames.recv() => frame,
        };
        match frame {
            Some(frame) => {
                stats.record_frame_received();
                *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
            }
            // Producer stopped; wind the whole pipeline down.
            None => break,
        }
    }
    running.store(false, Ordering::Release);
    debug!("frame intake ended");
}

#[allow(clippy::too_many_arguments)]
async fn process_loop(
    mut worker: EstimatorWorker,
    latest: Arc<Mutex<Option<VideoFrame>>>,
    running: Arc<AtomicBool>,
    state: SharedBodyState,
    mut publisher: Box<dyn LandmarkPublisher>,
    options: PipelineOptions,
    stats: SharedSessionStats,
) {
    let mut neck = SmoothingWindow::new(options.smoothing_window);
    let mut left_elbow = SmoothingWindow::new(options.smoothing_window);
    let mut right_elbow = SmoothingWindow::new(options.smoothing_window);
    let mut last_publish: Option<Instant> = None;

    while running.load(Ordering::Acquire) {
        let frame = latest.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(frame) = frame else {
            tokio::time::sleep(options.idle_poll).await;
            continue;
        };

        let outcome = match worker.process(frame).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // A failing estimator cannot recover mid-session; stop and
                // let the host start a fresh pipeline if it wants one.
                warn!(error = %e, "frame processing failed, stopping pipeline");
                break;
            }
        };
        stats.record_frame_processed();

        match outcome {
            FrameOutcome::NoSubject => {
                stats.record_no_subject();
            }
            FrameOutcome::CameraCovered => {
                stats.record_covered();
                state.update(MetricsUpdate::camera_covered());
            }
            FrameOutcome::Reading(reading) => {
                let neck_stable = neck.push(reading.angles.neck);
                let left_stable = left_elbow.push(reading.angles.left_elbow);
                let right_stable = right_elbow.push(reading.angles.right_elbow);

                state.update(MetricsUpdate {
                    is_upper_body_only: Some(reading.is_upper_body_only),
                    neck_angle: Some(round_tenth(neck_stable)),
                    arm_angles: Some(ArmAngles {
                        left_elbow: round_tenth(left_stable),
                        right_elbow: round_tenth(right_stable),
                    }),
                    pointed_body_part: Some(reading.pointed_body_part),
                });

                let due = last_publish
                    .map_or(true, |at| at.elapsed() >= options.publish_interval);
                if due {
                    last_publish = Some(Instant::now());
                    match publisher.publish(&reading.landmarks) {
                        Ok(()) => stats.record_landmarks_published(),
                        // Best-effort: the overlay misses a frame, nothing more.
                        Err(e) => debug!(error = %e, "landmark publish failed"),
                    }
                }
            }
        }
    }

    running.store(false, Ordering::Release);
    worker.shutdown().await;
    debug!("process loop ended");
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
