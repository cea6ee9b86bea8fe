//! Pose landmark data model.
//!
//! A pose estimate is a fixed, ordered set of 33 anatomical landmarks in
//! frame-relative coordinates, produced once per estimator invocation and
//! discarded after processing. Nothing here is ever written to disk.

use serde::{Deserialize, Serialize};

/// The 33 pose landmark indices, in estimator output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;
}

/// Leg landmarks used for the upper-body-only classification:
/// knees, ankles, heels and foot indices.
pub const LOWER_BODY: [LandmarkIndex; 8] = [
    LandmarkIndex::LeftKnee,
    LandmarkIndex::RightKnee,
    LandmarkIndex::LeftAnkle,
    LandmarkIndex::RightAnkle,
    LandmarkIndex::LeftHeel,
    LandmarkIndex::RightHeel,
    LandmarkIndex::LeftFootIndex,
    LandmarkIndex::RightFootIndex,
];

/// A single landmark in frame-relative coordinates (0.0-1.0) with a
/// visibility score (0.0-1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility,
        }
    }

    /// Whether the visibility score meets a threshold.
    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visibility >= threshold
    }

    /// (x, y, z) tuple for angle computations.
    pub fn point(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Planar distance to another landmark, ignoring depth.
    pub fn planar_distance(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Default for Landmark {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            visibility: 0.0,
        }
    }
}

/// The full set of 33 landmarks for one detected subject in one frame.
#[derive(Debug, Clone)]
pub struct PoseEstimate {
    pub landmarks: [Landmark; LandmarkIndex::COUNT],
}

impl PoseEstimate {
    pub fn new(landmarks: [Landmark; LandmarkIndex::COUNT]) -> Self {
        Self { landmarks }
    }

    pub fn get(&self, index: LandmarkIndex) -> &Landmark {
        &self.landmarks[index as usize]
    }

    pub fn visibility(&self, index: LandmarkIndex) -> f64 {
        self.landmarks[index as usize].visibility
    }
}

impl Default for PoseEstimate {
    fn default() -> Self {
        Self {
            landmarks: [Landmark::default(); LandmarkIndex::COUNT],
        }
    }
}
