//! Observation value types for point-to-line calibration.
//!
//! A calibration session accumulates [`Correspondence`] observations: one
//! landmark point in image space paired with the tracked instrument axis
//! ([`Line3`]) in tracker space at the instant of capture.

use serde::{Deserialize, Serialize};

use crate::math::{basis_column, translation_of, Mat4, Real, Vec3};

/// Minimum squared norm for a line direction to count as non-degenerate.
pub const DIRECTION_EPS: Real = 1e-12;

/// A 3D line given by an origin and a unit direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3 {
    /// A point on the line (tracker space).
    pub origin: Vec3,
    /// Unit direction of the line (tracker space).
    pub direction: Vec3,
}

impl Line3 {
    /// Build a line from an origin and a direction, normalizing the direction.
    ///
    /// Returns `None` when the direction has (near-)zero length.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        if direction.norm_squared() < DIRECTION_EPS {
            return None;
        }
        Some(Self {
            origin,
            direction: direction.normalize(),
        })
    }

    /// Derive the instrument axis line from a tracked pose matrix.
    ///
    /// Tracked tools report their shaft direction as the third basis column,
    /// so `origin = pose.translation` and `direction = pose.column(2)`.
    /// Returns `None` for a degenerate pose (zero-length axis column).
    pub fn from_pose(pose: &Mat4) -> Option<Self> {
        Self::new(translation_of(pose), basis_column(pose, 2))
    }

    /// Perpendicular distance from a point to this line.
    pub fn distance_to_point(&self, p: &Vec3) -> Real {
        let v = p - self.origin;
        (v - self.direction * v.dot(&self.direction)).norm()
    }

    /// Orthogonal projection of a point onto this line.
    pub fn project_point(&self, p: &Vec3) -> Vec3 {
        let v = p - self.origin;
        self.origin + self.direction * v.dot(&self.direction)
    }
}

/// One observation: a landmark point in image space (`z = 0`) paired with the
/// tracked instrument axis in tracker space at capture time.
///
/// Immutable once created; sessions store correspondences in capture order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Landmark point in image pixel coordinates, lifted onto `z = 0`.
    pub point: Vec3,
    /// Instrument axis at capture time.
    pub line: Line3,
}

impl Correspondence {
    pub fn new(point: Vec3, line: Line3) -> Self {
        Self { point, line }
    }
}

/// Probe geometry descriptor supplied by the imaging source.
///
/// Selects the automatic segmentation strategy and carries the per-probe
/// parameters it needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProbeGeometry {
    /// Linear-array probe: rectangular field of view.
    Linear,
    /// Curvilinear probe: wedge-shaped field of view with the given
    /// approximate beam half-angle in radians.
    Curvilinear { beam_half_angle: Real },
    /// Single-element (A-mode) transducer: a one-line intensity trace.
    AMode,
}
