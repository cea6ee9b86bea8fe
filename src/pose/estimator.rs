//! Pose estimator contract.
//!
//! The estimator is an external capability (a loaded model) that maps one
//! RGB frame plus a monotonic timestamp to at most one pose estimate. A
//! single instance is stateful across frames: calls must be issued in
//! non-decreasing timestamp order and never concurrently, which is why the
//! pipeline confines the instance to one dedicated worker thread.

use crate::pose::landmark::PoseEstimate;
use crate::vision::frame::VideoFrame;

/// One pose estimator instance.
///
/// Implementations wrap whatever inference backend the host provides.
/// `detect` returns `Ok(None)` when no subject is in frame - an expected,
/// frequent outcome, not an error.
pub trait PoseEstimator {
    /// Run inference on one frame. `timestamp_ms` must be non-decreasing
    /// across calls for the lifetime of the instance.
    fn detect(
        &mut self,
        frame: &VideoFrame,
        timestamp_ms: i64,
    ) -> Result<Option<PoseEstimate>, EstimatorError>;

    /// Release the model resource. Called exactly once by the pipeline
    /// worker on teardown.
    fn close(&mut self);
}

/// Estimator construction or inference failures.
#[derive(Debug)]
pub enum EstimatorError {
    /// The model asset could not be found or loaded. Fatal at pipeline start.
    ModelUnavailable(String),
    /// The inference backend rejected or failed on a frame.
    Inference(String),
}

impl std::fmt::Display for EstimatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimatorError::ModelUnavailable(e) => write!(f, "model unavailable: {e}"),
            EstimatorError::Inference(e) => write!(f, "inference failed: {e}"),
        }
    }
}

impl std::error::Error for EstimatorError {}
