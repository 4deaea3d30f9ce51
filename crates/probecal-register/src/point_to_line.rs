//! Iterative point-to-line registration.
//!
//! Accumulates point/line pairs and solves for the transform minimizing the
//! sum of squared perpendicular distances from the transformed points to
//! their lines. The solve alternates a closed-form landmark fit with
//! re-projection of the transformed points onto the lines, and stops when the
//! residual field changes by less than the tolerance between iterations.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use probecal_core::{compose_homogeneous, Line3, Mat3, Mat4, Real, Vec3, DIRECTION_EPS};

use crate::landmark::{fit_landmarks, RegisterError, RegistrationMode};

/// Iteration cap for the alternating solve; pathological geometry becomes a
/// reportable failure instead of an unbounded loop. The alternation converges
/// linearly, so tight tolerances legitimately take a few thousand iterations.
const MAX_ITERATIONS: usize = 10_000;

/// Default convergence tolerance on the residual-field change.
///
/// The achieved point-to-line error sits one to two orders of magnitude above
/// this value because of the linear convergence rate, so the default is kept
/// tight: noiseless data solves to roughly 1e-8.
pub const DEFAULT_TOLERANCE: Real = 1e-9;

/// Residual-field changes below this fraction of the residual magnitude are
/// floating-point noise; a non-decreasing change at that level means the
/// iteration has reached its numeric fixed point.
const STAGNATION_SCALE: Real = 1000.0 * Real::EPSILON;

/// Outcome of a successful point-to-line solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResult {
    /// Homogeneous image-to-probe transform.
    pub transform: Mat4,
    /// Rotation part.
    pub rotation: Mat3,
    /// Per-axis scale (uniform for similarity mode, unit for rigid).
    pub scale: Vec3,
    /// Translation part.
    pub translation: Vec3,
    /// Mean perpendicular point-to-line distance, the primary error metric.
    pub mean_error: Real,
    /// Root-mean-square perpendicular point-to-line distance.
    pub rms_error: Real,
    /// Iterations taken to converge.
    pub iterations: usize,
}

impl RegistrationResult {
    /// Apply the solved transform to a point.
    pub fn apply(&self, p: &Vec3) -> Vec3 {
        self.rotation * self.scale.component_mul(p) + self.translation
    }
}

/// Incremental point-to-line registration solver.
///
/// Correspondences are appended one per capture; the solve is explicit so
/// callers can batch several additions before paying its cost. The mode is
/// fixed at construction. A failed solve keeps the last good result.
#[derive(Debug, Clone)]
pub struct PointToLineRegistration {
    mode: RegistrationMode,
    tolerance: Real,
    points: Vec<Vec3>,
    lines: Vec<Line3>,
    result: Option<RegistrationResult>,
}

impl PointToLineRegistration {
    pub fn new(mode: RegistrationMode) -> Self {
        Self {
            mode,
            tolerance: DEFAULT_TOLERANCE,
            points: Vec::new(),
            lines: Vec::new(),
            result: None,
        }
    }

    pub fn with_tolerance(mode: RegistrationMode, tolerance: Real) -> Self {
        let mut s = Self::new(mode);
        s.tolerance = tolerance;
        s
    }

    pub fn mode(&self) -> RegistrationMode {
        self.mode
    }

    pub fn tolerance(&self) -> Real {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: Real) {
        self.tolerance = tolerance;
    }

    /// Append one correspondence. Does not recompute the registration.
    pub fn add_point_and_line(&mut self, point: Vec3, line: Line3) {
        self.points.push(point);
        self.lines.push(line);
    }

    /// Number of correspondences currently held.
    pub fn count(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the held set is below the mode's determined minimum.
    pub fn is_under_determined(&self) -> bool {
        self.points.len() < self.mode.min_correspondences()
    }

    /// Clear all correspondences and the cached result. Idempotent.
    pub fn reset(&mut self) {
        self.points.clear();
        self.lines.clear();
        self.result = None;
    }

    /// Last successful solve, if any.
    pub fn result(&self) -> Option<&RegistrationResult> {
        self.result.as_ref()
    }

    /// Mean point-to-line distance of the last successful solve.
    pub fn error(&self) -> Option<Real> {
        self.result.as_ref().map(|r| r.mean_error)
    }

    /// Solve over all currently held correspondences.
    ///
    /// Deterministic for a given sequence and mode. Under-determined sets
    /// still produce a best-effort result (logged as a warning). On failure
    /// the previously cached result is retained untouched.
    pub fn calculate_registration(&mut self) -> Result<&RegistrationResult, RegisterError> {
        let solved = self.solve()?;
        Ok(self.result.insert(solved))
    }

    fn solve(&self) -> Result<RegistrationResult, RegisterError> {
        let n = self.points.len();
        if n == 0 {
            return Err(RegisterError::Empty);
        }
        if self.is_under_determined() {
            warn!(
                "solving {} mode with {} of {} recommended correspondences",
                self.mode,
                n,
                self.mode.min_correspondences()
            );
        }

        let finite = |v: &Vec3| v.iter().all(|c| c.is_finite());
        if !self.points.iter().all(finite)
            || !self
                .lines
                .iter()
                .all(|l| finite(&l.origin) && finite(&l.direction))
        {
            return Err(RegisterError::NonFinite);
        }

        let mut directions = Vec::with_capacity(n);
        for (i, line) in self.lines.iter().enumerate() {
            let norm_sq = line.direction.norm_squared();
            if norm_sq < DIRECTION_EPS {
                return Err(RegisterError::DegenerateDirection(i));
            }
            directions.push(line.direction / norm_sq.sqrt());
        }

        // Seed targets one unit along each line.
        let mut targets: Vec<Vec3> = self
            .lines
            .iter()
            .zip(directions.iter())
            .map(|(line, d)| line.origin + d)
            .collect();

        let mut residuals = vec![Vec3::zeros(); n];
        let mut residuals_old = vec![Vec3::repeat(1000.0); n];

        let mut fit = None;
        let mut iterations = 0;
        let mut prev_delta = Real::INFINITY;
        for iter in 0..MAX_ITERATIONS {
            let step = fit_landmarks(&self.points, &targets, self.mode)?;

            let mut residual_sq = 0.0;
            for i in 0..n {
                let q = step.apply(&self.points[i]);
                let along = (q - self.lines[i].origin).dot(&directions[i]);
                targets[i] = self.lines[i].origin + directions[i] * along;
                residuals[i] = targets[i] - q;
                residual_sq += residuals[i].norm_squared();
            }

            let mut delta_sq = 0.0;
            for (e, e_old) in residuals.iter().zip(residuals_old.iter()) {
                delta_sq += (e - e_old).norm_squared();
            }
            let delta = delta_sq.sqrt();
            residuals_old.copy_from_slice(&residuals);

            fit = Some(step);
            iterations = iter + 1;

            // Converged, or the residual field has stopped moving and is only
            // jittering at floating-point noise level.
            let noise_floor = STAGNATION_SCALE * (1.0 + residual_sq.sqrt());
            if delta <= self.tolerance || (delta >= prev_delta && delta < noise_floor) {
                break;
            }
            prev_delta = delta;
            if iter + 1 == MAX_ITERATIONS {
                return Err(RegisterError::DidNotConverge(MAX_ITERATIONS));
            }
        }
        let fit = fit.expect("at least one iteration ran");

        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for e in &residuals {
            let d = e.norm();
            sum += d;
            sum_sq += d * d;
        }
        let mean_error = sum / n as Real;
        let rms_error = (sum_sq / n as Real).sqrt();

        let linear = fit.linear();
        let transform = compose_homogeneous(&linear, &fit.translation);
        if !transform.iter().all(|v| v.is_finite()) || !mean_error.is_finite() {
            return Err(RegisterError::NonFinite);
        }

        debug!(
            "point-to-line solve: {} pairs, {} iterations, mean error {:.3e}",
            n, iterations, mean_error
        );

        Ok(RegistrationResult {
            transform,
            rotation: fit.rotation,
            scale: fit.scale,
            translation: fit.translation,
            mean_error,
            rms_error,
            iterations,
        })
    }
}
