//! Closed-form landmark (point-to-point) alignment.
//!
//! Fits `target_i ≈ R * S * source_i + t` in the least-squares sense, where
//! `R` is a rotation from the Kabsch algorithm and `S` is a diagonal scale
//! constrained by the registration mode. Used as the inner step of the
//! point-to-line solve.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use probecal_core::{Mat3, Real, Vec3};

/// Degrees-of-freedom constraint on the fitted transform.
///
/// Mutually exclusive; fixed when a solver or session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationMode {
    /// Rotation + translation (6 DOF), scale fixed at 1.
    Rigid,
    /// Uniform scale + rotation + translation (7 DOF).
    Similarity,
    /// Independent per-axis scale + rotation + translation (9 DOF).
    Anisotropic,
}

impl RegistrationMode {
    /// Correspondences needed for a numerically determined solve.
    ///
    /// Each point-line pair contributes two constraints, so this is the DOF
    /// count rounded up to whole pairs. The count assumes non-degenerate
    /// geometry: pairs with spread-out points and non-parallel line
    /// directions. Degenerate configurations need more pairs, and solves
    /// below this count still return a best-effort result.
    pub fn min_correspondences(&self) -> usize {
        match self {
            RegistrationMode::Rigid => 3,
            RegistrationMode::Similarity => 4,
            RegistrationMode::Anisotropic => 5,
        }
    }
}

impl std::fmt::Display for RegistrationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationMode::Rigid => write!(f, "rigid"),
            RegistrationMode::Similarity => write!(f, "similarity"),
            RegistrationMode::Anisotropic => write!(f, "anisotropic"),
        }
    }
}

/// Errors surfaced by the registration solvers.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("no correspondences to solve")]
    Empty,
    #[error("source and target point counts differ ({0} vs {1})")]
    CountMismatch(usize, usize),
    #[error("svd failed")]
    SvdFailed,
    #[error("degenerate line direction in correspondence {0}")]
    DegenerateDirection(usize),
    #[error("registration produced a non-finite result")]
    NonFinite,
    #[error("registration did not converge within {0} iterations")]
    DidNotConverge(usize),
}

/// Result of a landmark fit: `p -> rotation * diag(scale) * p + translation`.
#[derive(Debug, Clone, Copy)]
pub struct LandmarkFit {
    pub rotation: Mat3,
    pub scale: Vec3,
    pub translation: Vec3,
}

impl LandmarkFit {
    /// Combined linear part `rotation * diag(scale)`.
    pub fn linear(&self) -> Mat3 {
        self.rotation * Mat3::from_diagonal(&self.scale)
    }

    /// Apply the fitted transform to a point.
    pub fn apply(&self, p: &Vec3) -> Vec3 {
        self.rotation * self.scale.component_mul(p) + self.translation
    }
}

/// Least-squares landmark alignment of `source` onto `target`.
///
/// Rotation via Kabsch (cross-covariance SVD with reflection fix); scale per
/// the mode, regressed against the rotated source deviations; translation
/// from the centroids. Axes with no spread in the source (for image-plane
/// points, the z axis) keep scale 1 rather than producing an unconstrained
/// estimate.
pub fn fit_landmarks(
    source: &[Vec3],
    target: &[Vec3],
    mode: RegistrationMode,
) -> Result<LandmarkFit, RegisterError> {
    if source.is_empty() {
        return Err(RegisterError::Empty);
    }
    if source.len() != target.len() {
        return Err(RegisterError::CountMismatch(source.len(), target.len()));
    }

    let n = source.len() as Real;
    let mut c_s = Vec3::zeros();
    let mut c_t = Vec3::zeros();
    for (s, t) in source.iter().zip(target.iter()) {
        c_s += s;
        c_t += t;
    }
    c_s /= n;
    c_t /= n;

    let mut h = Mat3::zeros();
    for (s, t) in source.iter().zip(target.iter()) {
        let ds = s - c_s;
        let dt = t - c_t;
        h += dt * ds.transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u.ok_or(RegisterError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(RegisterError::SvdFailed)?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_fix = u;
        u_fix.column_mut(2).neg_mut();
        r = u_fix * v_t;
    }

    let scale = match mode {
        RegistrationMode::Rigid => Vec3::new(1.0, 1.0, 1.0),
        RegistrationMode::Similarity => {
            let mut num = 0.0;
            let mut den = 0.0;
            for (s, t) in source.iter().zip(target.iter()) {
                let ds = s - c_s;
                let dt = t - c_t;
                num += dt.dot(&(r * ds));
                den += ds.norm_squared();
            }
            let s = if den > Real::EPSILON { num / den } else { 1.0 };
            Vec3::new(s, s, s)
        }
        RegistrationMode::Anisotropic => {
            // Per-axis regression of the back-rotated target deviations
            // against the source deviations.
            let mut num = Vec3::zeros();
            let mut den = Vec3::zeros();
            for (s, t) in source.iter().zip(target.iter()) {
                let ds = s - c_s;
                let dt_r = r.transpose() * (t - c_t);
                num += dt_r.component_mul(&ds);
                den += ds.component_mul(&ds);
            }
            Vec3::new(
                if den.x > Real::EPSILON { num.x / den.x } else { 1.0 },
                if den.y > Real::EPSILON { num.y / den.y } else { 1.0 },
                if den.z > Real::EPSILON { num.z / den.z } else { 1.0 },
            )
        }
    };

    let translation = c_t - r * scale.component_mul(&c_s);

    Ok(LandmarkFit {
        rotation: r,
        scale,
        translation,
    })
}
