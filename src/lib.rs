//! FlexFlow Vision Agent - zero-storage real-time pose metrics.
//!
//! This library turns a live video stream of a person exercising into
//! clinically meaningful body metrics (neck tilt, elbow flexion, body
//! coverage, pointing gesture) at interactive rates, without ever
//! persisting video or images.
//!
//! # Zero-Storage Guarantees
//!
//! - **No video**: frames are processed in memory and dropped immediately
//! - **No images**: nothing is ever written to disk
//! - **Lossy by design**: under load, stale frames are overwritten, never queued
//! - **Only metrics persist**: a single in-memory snapshot of four fields
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   FlexFlow Vision Agent                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌────────────┐   ┌───────────┐             │
//! │  │  Intake  │──▶│ Latest slot│──▶│ Estimator │             │
//! │  │  (async) │   │ (1 frame)  │   │  worker   │             │
//! │  └──────────┘   └────────────┘   └───────────┘             │
//! │                                        │                    │
//! │                        ┌───────────────┼──────────┐        │
//! │                        ▼               ▼          ▼        │
//! │                 ┌───────────┐   ┌───────────┐ ┌─────────┐  │
//! │                 │ Geometry  │──▶│ Smoothing │ │Landmark │  │
//! │                 │ (angles)  │   │ (mean 5)  │ │ publish │  │
//! │                 └───────────┘   └───────────┘ └─────────┘  │
//! │                                        │                    │
//! │                                        ▼                    │
//! │                                 ┌────────────┐              │
//! │                                 │ Whiteboard │              │
//! │                                 │ (metrics)  │              │
//! │                                 └────────────┘              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use flexflow_vision_agent::{
//!     frame_channel, ChannelPublisher, PipelineOptions, SharedBodyState, VisionPipeline,
//! };
//!
//! # async fn start_session() -> Result<(), Box<dyn std::error::Error>> {
//! let (frame_tx, frame_rx) = frame_channel(4);
//! let state = SharedBodyState::new();
//! let (overlay_tx, _overlay_rx) = tokio::sync::mpsc::channel(8);
//!
//! let pipeline = VisionPipeline::start(
//!     || host_estimator(),                       // built on the worker thread
//!     frame_rx,
//!     state.clone(),
//!     Box::new(ChannelPublisher::new(overlay_tx)),
//!     PipelineOptions::default(),
//! )
//! .await?;
//! # Ok(()) }
//! # fn host_estimator() -> Result<Box<dyn flexflow_vision_agent::PoseEstimator>, flexflow_vision_agent::EstimatorError> { unimplemented!() }
//! ```

pub mod config;
pub mod exercise;
pub mod pose;
pub mod publish;
pub mod state;
pub mod stats;
pub mod vision;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use pose::{EstimatorError, Landmark, LandmarkIndex, PoseEstimate, PoseEstimator};
pub use publish::{ChannelPublisher, LandmarkFrame, LandmarkPoint, LandmarkPublisher, PublishError};
pub use state::{ArmAngles, BodyMetrics, MetricsUpdate, SharedBodyState};
pub use stats::{SessionStats, StatsSnapshot};
pub use vision::{
    frame_channel, FrameOutcome, FrameReceiver, FrameSender, PipelineError, PipelineOptions,
    PipelineSlot, SmoothingWindow, VideoFrame, VisionPipeline,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║          FLEXFLOW VISION AGENT - PRIVACY DECLARATION             ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent reads your camera to coach you through exercises.    ║
║                                                                  ║
║  ✓ WHAT WE COMPUTE:                                              ║
║    • Joint angles (neck tilt, elbow flexion)                     ║
║    • Whether your lower body is in frame                         ║
║    • Which body part you are pointing at                         ║
║                                                                  ║
║  ✗ WHAT WE NEVER STORE:                                          ║
║    • Video frames or images (processed in memory, then dropped)  ║
║    • Landmark histories (discarded after each frame)             ║
║    • Any recording of your session                               ║
║                                                                  ║
║  All processing is local to the session. The only retained       ║
║  data is the latest four-field metrics snapshot, in memory.      ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
