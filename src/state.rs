//! Shared body-metrics state (the whiteboard).
//!
//! One instance per active session, written by the vision pipeline and read
//! by the agent tool layer and the HTTP surface. All four fields are
//! committed together under a single lock so readers only ever observe a
//! fully-formed snapshot. Accessors acquire, copy or mutate, and release;
//! no caller holds the lock across a suspend point.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Elbow flexion per arm, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmAngles {
    pub left_elbow: f64,
    pub right_elbow: f64,
}

impl Default for ArmAngles {
    fn default() -> Self {
        Self {
            left_elbow: 0.0,
            right_elbow: 0.0,
        }
    }
}

/// The published body metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyMetrics {
    /// True when the leg landmarks are not visible enough to use.
    pub is_upper_body_only: bool,
    /// Smoothed neck tilt in degrees.
    pub neck_angle: f64,
    /// Smoothed elbow flexion per arm.
    pub arm_angles: ArmAngles,
    /// Body part the user is pointing at, or empty.
    pub pointed_body_part: String,
}

impl Default for BodyMetrics {
    fn default() -> Self {
        Self {
            is_upper_body_only: true,
            neck_angle: 0.0,
            arm_angles: ArmAngles::default(),
            pointed_body_part: String::new(),
        }
    }
}

impl BodyMetrics {
    /// Human-readable pointed part for the tool layer.
    pub fn pointed_part_label(&self) -> &str {
        if self.pointed_body_part.is_empty() {
            "(none)"
        } else {
            &self.pointed_body_part
        }
    }
}

/// A partial update; only the provided fields are applied, atomically.
#[derive(Debug, Clone, Default)]
pub struct MetricsUpdate {
    pub is_upper_body_only: Option<bool>,
    pub neck_angle: Option<f64>,
    pub arm_angles: Option<ArmAngles>,
    pub pointed_body_part: Option<String>,
}

impl MetricsUpdate {
    /// The camera-covered transition: revert to upper-body-only and clear
    /// the pointed part, leaving angles as they were.
    pub fn camera_covered() -> Self {
        Self {
            is_upper_body_only: Some(true),
            pointed_body_part: Some(String::new()),
            ..Self::default()
        }
    }
}

/// Concurrency-safe container for the latest metrics.
#[derive(Debug, Clone, Default)]
pub struct SharedBodyState {
    inner: Arc<Mutex<BodyMetrics>>,
}

impl SharedBodyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of the current metrics.
    pub fn snapshot(&self) -> BodyMetrics {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply the provided fields in one critical section.
    pub fn update(&self, update: MetricsUpdate) {
        let mut metrics = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(v) = update.is_upper_body_only {
            metrics.is_upper_body_only = v;
        }
        if let Some(v) = update.neck_angle {
            metrics.neck_angle = v;
        }
        if let Some(v) = update.arm_angles {
            metrics.arm_angles = v;
        }
        if let Some(v) = update.pointed_body_part {
            metrics.pointed_body_part = v;
        }
    }
}
