//! Pipeline demo: drive the full vision pipeline with a scripted
//! estimator and synthetic frames, printing the whiteboard as it evolves.
//!
//! Run with: cargo run --example pipeline_demo

use std::time::Duration;

use flexflow_vision_agent::{
    frame_channel, ChannelPublisher, EstimatorError, Landmark, LandmarkIndex, PipelineOptions,
    PoseEstimate, PoseEstimator, SharedBodyState, VideoFrame, VisionPipeline,
};

/// Estimator that sweeps the right elbow between 90 and 140 degrees.
struct SweepEstimator {
    step: u64,
}

impl PoseEstimator for SweepEstimator {
    fn detect(
        &mut self,
        _frame: &VideoFrame,
        _timestamp_ms: i64,
    ) -> Result<Option<PoseEstimate>, EstimatorError> {
        self.step += 1;
        let phase = (self.step % 40) as f64 / 40.0;
        let degrees = 90.0 + 50.0 * (phase * std::f64::consts::TAU).sin().abs();

        let mut landmarks = [Landmark::new(0.5, 0.4, 0.0, 0.9); LandmarkIndex::COUNT];
        let theta = degrees.to_radians();
        landmarks[LandmarkIndex::RightShoulder as usize] = Landmark::new(0.35, 0.40, 0.0, 0.9);
        landmarks[LandmarkIndex::RightElbow as usize] = Landmark::new(0.35, 0.60, 0.0, 0.9);
        landmarks[LandmarkIndex::RightWrist as usize] = Landmark::new(
            0.35 + 0.2 * theta.sin(),
            0.60 - 0.2 * theta.cos(),
            0.0,
            0.9,
        );
        // Legs out of frame, as in a seated session.
        for index in [
            LandmarkIndex::LeftKnee,
            LandmarkIndex::RightKnee,
            LandmarkIndex::LeftAnkle,
            LandmarkIndex::RightAnkle,
            LandmarkIndex::LeftHeel,
            LandmarkIndex::RightHeel,
            LandmarkIndex::LeftFootIndex,
            LandmarkIndex::RightFootIndex,
        ] {
            landmarks[index as usize].visibility = 0.1;
        }
        // Hands down: no pointing gesture in this scene.
        landmarks[LandmarkIndex::LeftIndex as usize].visibility = 0.3;
        landmarks[LandmarkIndex::RightIndex as usize].visibility = 0.3;

        Ok(Some(PoseEstimate::new(landmarks)))
    }

    fn close(&mut self) {
        println!("estimator released after {} frames", self.step);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let (frame_tx, frame_rx) = frame_channel(4);
    let state = SharedBodyState::new();
    let (overlay_tx, mut overlay_rx) = tokio::sync::mpsc::channel(8);

    let mut pipeline = VisionPipeline::start(
        || Ok(Box::new(SweepEstimator { step: 0 }) as Box<dyn PoseEstimator>),
        frame_rx,
        state.clone(),
        Box::new(ChannelPublisher::new(overlay_tx)),
        PipelineOptions::default(),
    )
    .await?;

    // Count overlay payloads on the side, like a frontend would.
    let overlay = tokio::spawn(async move {
        let mut count = 0u64;
        while overlay_rx.recv().await.is_some() {
            count += 1;
        }
        count
    });

    // Feed synthetic 30fps frames for three seconds.
    let feeder = tokio::spawn(async move {
        for i in 0..90i64 {
            let frame = VideoFrame::new(vec![0; 64 * 48 * 3], 64, 48, i * 33_333);
            if frame_tx.send(frame).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(33)).await;
        }
    });

    for _ in 0..6 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let snapshot = state.snapshot();
        println!(
            "neck {:6.1}°  left elbow {:6.1}°  right elbow {:6.1}°  upper-body-only {}  pointing {}",
            snapshot.neck_angle,
            snapshot.arm_angles.left_elbow,
            snapshot.arm_angles.right_elbow,
            snapshot.is_upper_body_only,
            snapshot.pointed_part_label(),
        );
    }

    feeder.await?;
    pipeline.close().await;

    let stats = pipeline.stats();
    println!(
        "frames: {} received, {} processed, {} dropped",
        stats.frames_received, stats.frames_processed, stats.frames_dropped
    );
    println!("overlay payloads: {}", overlay.await?);

    Ok(())
}
