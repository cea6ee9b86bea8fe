//! Real-time pose-to-metrics processing.
//!
//! Frames flow from the transport into a single-slot buffer, through the
//! estimator worker and the geometry/smoothing stages, and out to the
//! whiteboard and the landmark observer channel.

pub mod frame;
pub mod geometry;
pub mod pipeline;
pub mod processor;
pub mod smoothing;

pub use frame::{frame_channel, FrameReceiver, FrameSender, VideoFrame};
pub use pipeline::{PipelineError, PipelineOptions, PipelineSlot, VisionPipeline};
pub use processor::{BodyReading, FrameOutcome, FrameProcessor, RawAngles};
pub use smoothing::{SmoothingWindow, DEFAULT_WINDOW};
