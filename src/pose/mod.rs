//! Pose data model and the external estimator contract.

pub mod estimator;
pub mod landmark;

pub use estimator::{EstimatorError, PoseEstimator};
pub use landmark::{Landmark, LandmarkIndex, PoseEstimate, LOWER_BODY};
