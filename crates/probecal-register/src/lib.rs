//! Point-to-line registration for ultrasound probe calibration.
//!
//! Solves for the transform mapping landmark points in image space onto their
//! corresponding tracked instrument axes in probe/tracker space, minimizing
//! the sum of squared perpendicular point-to-line distances.
//!
//! # Algorithm
//!
//! The solve alternates two steps until the residual field settles:
//! 1. a closed-form landmark (point-to-point) fit of the image points against
//!    per-line target points ([`fit_landmarks`]),
//! 2. re-projection of the transformed points onto their lines to refresh the
//!    targets.
//!
//! The landmark fit is constrained by the [`RegistrationMode`] chosen at
//! solver construction: rigid (rotation + translation), similarity (uniform
//! scale), or anisotropic (per-axis scale).

mod landmark;
mod point_to_line;

pub use landmark::{fit_landmarks, LandmarkFit, RegisterError, RegistrationMode};
pub use point_to_line::{PointToLineRegistration, RegistrationResult, DEFAULT_TOLERANCE};
