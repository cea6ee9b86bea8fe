//! Per-frame processing: pose estimation plus body-coverage, pointing and
//! angle classification.
//!
//! This runs on the pipeline's dedicated worker thread because inference is
//! heavy relative to the frame rate. Each frame yields exactly one
//! [`FrameOutcome`]; raw estimates are dropped as soon as the outcome is
//! built.

use crate::pose::estimator::{EstimatorError, PoseEstimator};
use crate::pose::landmark::{LandmarkIndex, PoseEstimate, LOWER_BODY};
use crate::publish::LandmarkFrame;
use crate::vision::frame::VideoFrame;
use crate::vision::geometry::{elbow_flexion_degrees, neck_tilt_degrees};

/// Below this visibility on every landmark the camera is considered
/// covered rather than the subject merely occluded.
const COVERED_VISIBILITY_FLOOR: f64 = 0.1;

/// Visibility required for lower-body classification and pointing.
const FEATURE_VISIBILITY: f64 = 0.5;

/// Maximum planar distance between a fingertip and a target landmark for a
/// pointing match, in frame-relative units.
const POINTING_DISTANCE: f64 = 0.1;

/// Candidate pointing targets, in match-priority order.
const POINTING_TARGETS: [(LandmarkIndex, &str); 6] = [
    (LandmarkIndex::LeftShoulder, "Left Shoulder"),
    (LandmarkIndex::RightShoulder, "Right Shoulder"),
    (LandmarkIndex::LeftElbow, "Left Elbow"),
    (LandmarkIndex::RightElbow, "Right Elbow"),
    (LandmarkIndex::LeftKnee, "Left Knee"),
    (LandmarkIndex::RightKnee, "Right Knee"),
];

/// Index fingertips checked for pointing, left hand first.
const POINTING_HANDS: [LandmarkIndex; 2] = [LandmarkIndex::LeftIndex, LandmarkIndex::RightIndex];

/// Raw (unsmoothed) angle readings for one frame. `None` means the
/// landmarks for that angle were not visible enough this frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawAngles {
    pub neck: Option<f64>,
    pub left_elbow: Option<f64>,
    pub right_elbow: Option<f64>,
}

/// Everything extracted from one frame with a usable subject.
#[derive(Debug, Clone)]
pub struct BodyReading {
    pub is_upper_body_only: bool,
    pub angles: RawAngles,
    /// Label of the body part a fingertip is resting near, or empty.
    pub pointed_body_part: String,
    /// Compact landmark payload for the overlay observer.
    pub landmarks: LandmarkFrame,
}

/// Outcome of processing one frame.
#[derive(Debug, Clone)]
pub enum FrameOutcome {
    /// No subject in frame; nothing to update.
    NoSubject,
    /// A subject was reported but every landmark is near-invisible: the
    /// lens is blocked. The whiteboard reverts to upper-body-only.
    CameraCovered,
    /// A normal reading.
    Reading(BodyReading),
}

/// True when every landmark's visibility sits below the covered floor.
pub fn is_camera_covered(estimate: &PoseEstimate) -> bool {
    estimate
        .landmarks
        .iter()
        .all(|lm| lm.visibility < COVERED_VISIBILITY_FLOOR)
}

/// True when every lower-body landmark is below the feature threshold,
/// i.e. the camera sees only the upper body.
pub fn is_upper_body_only(estimate: &PoseEstimate) -> bool {
    LOWER_BODY
        .iter()
        .all(|&i| estimate.visibility(i) < FEATURE_VISIBILITY)
}

/// Find the body part a fingertip is pointing at, or empty.
///
/// The left hand is checked before the right; for each visible fingertip
/// the nearest sufficiently visible target within [`POINTING_DISTANCE`]
/// wins, ties broken by target order. The first hand with any match
/// settles the result.
pub fn pointed_body_part(estimate: &PoseEstimate) -> String {
    for &hand in &POINTING_HANDS {
        let fingertip = estimate.get(hand);
        if !fingertip.is_visible(FEATURE_VISIBILITY) {
            continue;
        }

        let mut min_dist = f64::INFINITY;
        let mut closest = "";
        for &(target, label) in &POINTING_TARGETS {
            let target_lm = estimate.get(target);
            if !target_lm.is_visible(FEATURE_VISIBILITY) {
                continue;
            }
            let dist = fingertip.planar_distance(target_lm);
            if dist < POINTING_DISTANCE && dist < min_dist {
                min_dist = dist;
                closest = label;
            }
        }

        if !closest.is_empty() {
            return closest.to_string();
        }
    }

    String::new()
}

/// Compute all raw angle readings for one estimate.
pub fn raw_angles(estimate: &PoseEstimate) -> RawAngles {
    RawAngles {
        neck: neck_tilt_degrees(
            estimate.get(LandmarkIndex::Nose),
            estimate.get(LandmarkIndex::LeftShoulder),
            estimate.get(LandmarkIndex::RightShoulder),
        ),
        left_elbow: elbow_flexion_degrees(
            estimate.get(LandmarkIndex::LeftShoulder),
            estimate.get(LandmarkIndex::LeftElbow),
            estimate.get(LandmarkIndex::LeftWrist),
        ),
        right_elbow: elbow_flexion_degrees(
            estimate.get(LandmarkIndex::RightShoulder),
            estimate.get(LandmarkIndex::RightElbow),
            estimate.get(LandmarkIndex::RightWrist),
        ),
    }
}

/// Owns the estimator instance and turns frames into outcomes.
///
/// Confined to the worker thread; the estimator is released through
/// [`FrameProcessor::close`] exactly once.
pub struct FrameProcessor {
    estimator: Box<dyn PoseEstimator>,
}

impl FrameProcessor {
    pub fn new(estimator: Box<dyn PoseEstimator>) -> Self {
        Self { estimator }
    }

    /// Process one frame. Estimator timestamps are the frame capture
    /// timestamps, so ordering follows frame arrival order.
    pub fn process(&mut self, frame: &VideoFrame) -> Result<FrameOutcome, EstimatorError> {
        let estimate = match self.estimator.detect(frame, frame.timestamp_ms())? {
            Some(estimate) => estimate,
            None => return Ok(FrameOutcome::NoSubject),
        };

        if is_camera_covered(&estimate) {
            return Ok(FrameOutcome::CameraCovered);
        }

        Ok(FrameOutcome::Reading(BodyReading {
            is_upper_body_only: is_upper_body_only(&estimate),
            angles: raw_angles(&estimate),
            pointed_body_part: pointed_body_part(&estimate),
            landmarks: LandmarkFrame::from_estimate(&estimate),
        }))
    }

    /// Release the estimator resource.
    pub fn close(&mut self) {
        self.estimator.close();
    }
}
