//! Joint angle computations over pose landmarks.
//!
//! All angles use the unsigned 3D dot-product formulation: the angle at a
//! vertex between the rays to two other points, in degrees in [0, 180].
//! The result is symmetric under swapping the two non-vertex points; no
//! sign encodes tilt direction. Angles are reported as `None` when any
//! contributing landmark is below the visibility threshold, never as an
//! error.

use crate::pose::landmark::Landmark;

/// Minimum visibility for a landmark to contribute to an angle.
pub const MIN_VISIBILITY: f64 = 0.6;

/// Length of the synthetic vertical reference ray for neck tilt, in
/// frame-relative units.
const UP_REFERENCE_OFFSET: f64 = 0.1;

/// Angle at `vertex` between the rays to `a` and `c`, in degrees [0, 180].
///
/// Returns 0.0 when either ray is degenerate (length below 1e-6).
pub fn angle_degrees(
    a: (f64, f64, f64),
    vertex: (f64, f64, f64),
    c: (f64, f64, f64),
) -> f64 {
    let v1 = (a.0 - vertex.0, a.1 - vertex.1, a.2 - vertex.2);
    let v2 = (c.0 - vertex.0, c.1 - vertex.1, c.2 - vertex.2);

    let dot = v1.0 * v2.0 + v1.1 * v2.1 + v1.2 * v2.2;
    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1 + v1.2 * v1.2).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1 + v2.2 * v2.2).sqrt();

    if mag1 < 1e-6 || mag2 < 1e-6 {
        return 0.0;
    }

    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// Neck tilt: the angle of the nose relative to the shoulder mid-point,
/// measured against a synthetic straight-up reference above the mid-point.
///
/// `None` when any of the three landmarks is below [`MIN_VISIBILITY`].
pub fn neck_tilt_degrees(
    nose: &Landmark,
    left_shoulder: &Landmark,
    right_shoulder: &Landmark,
) -> Option<f64> {
    if !nose.is_visible(MIN_VISIBILITY)
        || !left_shoulder.is_visible(MIN_VISIBILITY)
        || !right_shoulder.is_visible(MIN_VISIBILITY)
    {
        return None;
    }

    let (lx, ly, lz) = left_shoulder.point();
    let (rx, ry, rz) = right_shoulder.point();
    let mid = ((lx + rx) / 2.0, (ly + ry) / 2.0, (lz + rz) / 2.0);

    // y grows downward in frame coordinates, so "up" is -y.
    let up = (mid.0, mid.1 - UP_REFERENCE_OFFSET, mid.2);

    Some(angle_degrees(up, mid, nose.point()))
}

/// Elbow flexion: the angle at the elbow between the shoulder and the
/// wrist. `None` when any of the three landmarks is below
/// [`MIN_VISIBILITY`].
pub fn elbow_flexion_degrees(
    shoulder: &Landmark,
    elbow: &Landmark,
    wrist: &Landmark,
) -> Option<f64> {
    if !shoulder.is_visible(MIN_VISIBILITY)
        || !elbow.is_visible(MIN_VISIBILITY)
        || !wrist.is_visible(MIN_VISIBILITY)
    {
        return None;
    }

    Some(angle_degrees(shoulder.point(), elbow.point(), wrist.point()))
}
