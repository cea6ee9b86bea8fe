//! Integration tests for the vision pipeline: end-to-end smoothing,
//! backpressure, camera-covered transitions and lifecycle.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flexflow_vision_agent::{
    frame_channel, ChannelPublisher, EstimatorError, Landmark, LandmarkIndex, PipelineOptions,
    PoseEstimate, PoseEstimator, SharedBodyState, VideoFrame, VisionPipeline,
};

/// Counters shared between a test and its estimator on the worker thread.
#[derive(Default)]
struct EstimatorProbe {
    calls: AtomicU64,
    closes: AtomicU64,
    last_timestamp_ms: AtomicI64,
}

/// Estimator that replays a fixed script of estimates, then keeps
/// returning `fallback`. Optionally sleeps per call to simulate slow
/// inference.
struct ScriptedEstimator {
    script: VecDeque<Option<PoseEstimate>>,
    fallback: Option<PoseEstimate>,
    delay: Duration,
    probe: Arc<EstimatorProbe>,
}

impl ScriptedEstimator {
    fn new(
        script: Vec<Option<PoseEstimate>>,
        fallback: Option<PoseEstimate>,
        delay: Duration,
        probe: Arc<EstimatorProbe>,
    ) -> Self {
        Self {
            script: script.into(),
            fallback,
            delay,
            probe,
        }
    }
}

impl PoseEstimator for ScriptedEstimator {
    fn detect(
        &mut self,
        _frame: &VideoFrame,
        timestamp_ms: i64,
    ) -> Result<Option<PoseEstimate>, EstimatorError> {
        self.probe.calls.fetch_add(1, Ordering::SeqCst);
        self.probe
            .last_timestamp_ms
            .store(timestamp_ms, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self
            .script
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }

    fn close(&mut self) {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn frame(timestamp_us: i64) -> VideoFrame {
    VideoFrame::new(vec![0; 4 * 4 * 3], 4, 4, timestamp_us)
}

fn uniform_estimate(visibility: f64) -> PoseEstimate {
    PoseEstimate::new([Landmark::new(0.5, 0.5, 0.0, visibility); LandmarkIndex::COUNT])
}

/// High-confidence pose whose right elbow is bent at `degrees`.
fn reading_estimate(degrees: f64) -> PoseEstimate {
    let mut estimate = uniform_estimate(0.9);
    let theta = degrees.to_radians();
    let elbow = (0.3, 0.6);
    // Upper arm points straight up from the elbow; the wrist direction
    // opens the requested angle against it.
    estimate.landmarks[LandmarkIndex::RightShoulder as usize] =
        Landmark::new(elbow.0, elbow.1 - 0.2, 0.0, 0.9);
    estimate.landmarks[LandmarkIndex::RightElbow as usize] =
        Landmark::new(elbow.0, elbow.1, 0.0, 0.9);
    estimate.landmarks[LandmarkIndex::RightWrist as usize] = Landmark::new(
        elbow.0 + 0.2 * theta.sin(),
        elbow.1 - 0.2 * theta.cos(),
        0.0,
        0.9,
    );
    estimate
}

fn fast_options() -> PipelineOptions {
    PipelineOptions {
        idle_poll: Duration::from_millis(5),
        ..PipelineOptions::default()
    }
}

fn publisher() -> (ChannelPublisher, tokio::sync::mpsc::Receiver<Vec<u8>>) {
    let (tx, rx) = tokio::sync::mpsc::channel(64);
    (ChannelPublisher::new(tx), rx)
}

async fn wait_for(mut cond: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_end_to_end_smoothing() {
    let probe = Arc::new(EstimatorProbe::default());
    let script: Vec<Option<PoseEstimate>> = [90.0, 92.0, 88.0, 91.0, 89.0]
        .iter()
        .map(|&deg| Some(reading_estimate(deg)))
        .collect();
    let estimator_probe = Arc::clone(&probe);

    let (frame_tx, frame_rx) = frame_channel(8);
    let state = SharedBodyState::new();
    let (publisher, _overlay_rx) = publisher();

    let mut pipeline = VisionPipeline::start(
        move || {
            Ok(Box::new(ScriptedEstimator::new(
                script,
                None,
                Duration::ZERO,
                estimator_probe,
            )) as Box<dyn PoseEstimator>)
        },
        frame_rx,
        state.clone(),
        Box::new(publisher),
        fast_options(),
    )
    .await
    .expect("pipeline start");

    for i in 0..5u64 {
        frame_tx
            .send(frame(i as i64 * 40_000))
            .await
            .expect("send frame");
        let stats = || pipeline.stats().frames_processed >= i + 1;
        assert!(
            wait_for(stats, Duration::from_secs(2)).await,
            "frame {i} not processed"
        );
    }

    let snapshot = state.snapshot();
    // Mean of [90, 92, 88, 91, 89] is exactly 90.
    assert!((snapshot.arm_angles.right_elbow - 90.0).abs() < 0.11);
    assert!(!snapshot.is_upper_body_only);
    assert!(pipeline.stats().landmarks_published >= 1);

    pipeline.close().await;
    assert_eq!(probe.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_backpressure_drops_frames_keeps_latest() {
    let probe = Arc::new(EstimatorProbe::default());
    let estimator_probe = Arc::clone(&probe);

    let (frame_tx, frame_rx) = frame_channel(64);
    let state = SharedBodyState::new();
    let (publisher, _overlay_rx) = publisher();

    let mut pipeline = VisionPipeline::start(
        move || {
            Ok(Box::new(ScriptedEstimator::new(
                Vec::new(),
                None,
                Duration::from_millis(30),
                estimator_probe,
            )) as Box<dyn PoseEstimator>)
        },
        frame_rx,
        state.clone(),
        Box::new(publisher),
        fast_options(),
    )
    .await
    .expect("pipeline start");

    let delivered = 30u64;
    let last_timestamp_us = (delivered as i64 - 1) * 1_000;
    for i in 0..delivered {
        frame_tx.send(frame(i as i64 * 1_000)).await.expect("send");
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    // Wait until processing has drained through to the final frame.
    let drained = wait_for(
        || probe.last_timestamp_ms.load(Ordering::SeqCst) == last_timestamp_us / 1000,
        Duration::from_secs(5),
    )
    .await;
    assert!(drained, "pipeline never processed the final frame");

    let stats = pipeline.stats();
    assert_eq!(stats.frames_received, delivered);
    assert!(
        stats.frames_processed < delivered,
        "slow processing must drop frames, processed {}",
        stats.frames_processed
    );
    assert_eq!(stats.frames_dropped, delivered - stats.frames_processed);

    pipeline.close().await;
}

#[tokio::test]
async fn test_camera_covered_preserves_angles() {
    let probe = Arc::new(EstimatorProbe::default());
    let script = vec![
        Some(reading_estimate(90.0)),
        Some(uniform_estimate(0.05)),
    ];
    let estimator_probe = Arc::clone(&probe);

    let (frame_tx, frame_rx) = frame_channel(8);
    let state = SharedBodyState::new();
    let (publisher, _overlay_rx) = publisher();

    let mut pipeline = VisionPipeline::start(
        move || {
            Ok(Box::new(ScriptedEstimator::new(
                script,
                None,
                Duration::ZERO,
                estimator_probe,
            )) as Box<dyn PoseEstimator>)
        },
        frame_rx,
        state.clone(),
        Box::new(publisher),
        fast_options(),
    )
    .await
    .expect("pipeline start");

    frame_tx.send(frame(0)).await.expect("send");
    assert!(
        wait_for(|| pipeline.stats().frames_processed >= 1, Duration::from_secs(2)).await
    );
    let before = state.snapshot();
    assert!(!before.is_upper_body_only);
    assert!(before.arm_angles.right_elbow > 0.0);
    // Every landmark overlaps every target in this synthetic pose, so the
    // left fingertip reads as resting on the left shoulder.
    assert_eq!(before.pointed_body_part, "Left Shoulder");

    frame_tx.send(frame(40_000)).await.expect("send");
    assert!(
        wait_for(|| pipeline.stats().covered_frames >= 1, Duration::from_secs(2)).await
    );

    let after = state.snapshot();
    assert!(after.is_upper_body_only);
    assert_eq!(after.pointed_body_part, "");
    assert_eq!(after.arm_angles.right_elbow, before.arm_angles.right_elbow);
    assert_eq!(after.neck_angle, before.neck_angle);

    pipeline.close().await;
}

#[tokio::test]
async fn test_publish_throttling() {
    let probe = Arc::new(EstimatorProbe::default());
    let estimator_probe = Arc::clone(&probe);

    let (frame_tx, frame_rx) = frame_channel(8);
    let state = SharedBodyState::new();
    let (publisher, mut overlay_rx) = publisher();

    let options = PipelineOptions {
        idle_poll: Duration::from_millis(5),
        // Effectively once per session: only the first reading publishes.
        publish_interval: Duration::from_secs(600),
        ..PipelineOptions::default()
    };

    let mut pipeline = VisionPipeline::start(
        move || {
            Ok(Box::new(ScriptedEstimator::new(
                Vec::new(),
                Some(reading_estimate(90.0)),
                Duration::ZERO,
                estimator_probe,
            )) as Box<dyn PoseEstimator>)
        },
        frame_rx,
        state,
        Box::new(publisher),
        options,
    )
    .await
    .expect("pipeline start");

    for i in 0..5u64 {
        frame_tx.send(frame(i as i64 * 40_000)).await.expect("send");
        assert!(
            wait_for(|| pipeline.stats().frames_processed >= i + 1, Duration::from_secs(2)).await
        );
    }

    assert_eq!(pipeline.stats().landmarks_published, 1);

    let payload = overlay_rx.recv().await.expect("published payload");
    let value: serde_json::Value = serde_json::from_slice(&payload).expect("valid json");
    assert_eq!(value["l"].as_array().expect("landmark array").len(), 33);

    pipeline.close().await;
}

#[tokio::test]
async fn test_cancel_during_inflight_call_closes_once() {
    let probe = Arc::new(EstimatorProbe::default());
    let estimator_probe = Arc::clone(&probe);

    let (frame_tx, frame_rx) = frame_channel(8);
    let state = SharedBodyState::new();
    let (publisher, _overlay_rx) = publisher();

    let mut pipeline = VisionPipeline::start(
        move || {
            Ok(Box::new(ScriptedEstimator::new(
                Vec::new(),
                None,
                Duration::from_millis(200),
                estimator_probe,
            )) as Box<dyn PoseEstimator>)
        },
        frame_rx,
        state,
        Box::new(publisher),
        fast_options(),
    )
    .await
    .expect("pipeline start");

    frame_tx.send(frame(0)).await.expect("send");
    assert!(
        wait_for(
            || probe.calls.load(Ordering::SeqCst) >= 1,
            Duration::from_secs(2)
        )
        .await,
        "estimator call never started"
    );

    // Close while the worker call is in flight.
    pipeline.close().await;
    assert!(!pipeline.is_running());
    assert_eq!(probe.closes.load(Ordering::SeqCst), 1);

    // Repeated close is a no-op.
    pipeline.close().await;
    assert_eq!(probe.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_frame_source_ending_stops_pipeline() {
    let probe = Arc::new(EstimatorProbe::default());
    let estimator_probe = Arc::clone(&probe);

    let (frame_tx, frame_rx) = frame_channel(8);
    let state = SharedBodyState::new();
    let (publisher, _overlay_rx) = publisher();

    let mut pipeline = VisionPipeline::start(
        move || {
            Ok(Box::new(ScriptedEstimator::new(
                Vec::new(),
                None,
                Duration::ZERO,
                estimator_probe,
            )) as Box<dyn PoseEstimator>)
        },
        frame_rx,
        state,
        Box::new(publisher),
        fast_options(),
    )
    .await
    .expect("pipeline start");

    drop(frame_tx);
    assert!(
        wait_for(|| !pipeline.is_running(), Duration::from_secs(2)).await,
        "pipeline kept running after the frame source ended"
    );

    pipeline.close().await;
    assert_eq!(probe.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_slot_closes_predecessor_on_replace() {
    use flexflow_vision_agent::PipelineSlot;

    let mut slot = PipelineSlot::new();
    let mut probes = Vec::new();
    let mut senders = Vec::new();

    for _ in 0..2 {
        let probe = Arc::new(EstimatorProbe::default());
        let estimator_probe = Arc::clone(&probe);
        probes.push(probe);

        let (frame_tx, frame_rx) = frame_channel(8);
        senders.push(frame_tx);
        let (publisher, _overlay_rx) = publisher();
        let pipeline = VisionPipeline::start(
            move || {
                Ok(Box::new(ScriptedEstimator::new(
                    Vec::new(),
                    None,
                    Duration::ZERO,
                    estimator_probe,
                )) as Box<dyn PoseEstimator>)
            },
            frame_rx,
            SharedBodyState::new(),
            Box::new(publisher),
            fast_options(),
        )
        .await
        .expect("pipeline start");
        slot.replace(pipeline).await;
    }

    // Replacing tore the first pipeline down; the second is still live.
    assert_eq!(probes[0].closes.load(Ordering::SeqCst), 1);
    assert_eq!(probes[1].closes.load(Ordering::SeqCst), 0);
    assert!(slot.get().map(|p| p.is_running()).unwrap_or(false));

    slot.close().await;
    assert_eq!(probes[1].closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_estimator_construction_failure_is_fatal() {
    let (_frame_tx, frame_rx) = frame_channel(8);
    let state = SharedBodyState::new();
    let (publisher, _overlay_rx) = publisher();

    let result = VisionPipeline::start(
        || Err(EstimatorError::ModelUnavailable("missing model asset".to_string())),
        frame_rx,
        state,
        Box::new(publisher),
        fast_options(),
    )
    .await;

    assert!(result.is_err());
}
