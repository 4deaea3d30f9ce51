//! Interactive capture session.
//!
//! A session owns the live correspondence list. After every mutation
//! (capture, undo, redo) the solve is replayed from the surviving
//! correspondences. When the replayed solve fails, the previous good result
//! is kept and the failure surfaces as [`CaptureError::RegistrationFailed`],
//! so the operator can collect more points or reset instead of being handed
//! a garbage transform.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use probecal_core::{image_point, Correspondence, GrayFrame, Line3, Mat4, ProbeGeometry, Pt2, Real};
use probecal_register::{
    PointToLineRegistration, RegisterError, RegistrationMode, RegistrationResult,
    DEFAULT_TOLERANCE,
};
use probecal_segment::{extract_automatic, extract_manual, SegmentError, SegmentationConfig};

/// Capture-time failures.
///
/// The session is unchanged for every variant except
/// [`CaptureError::RegistrationFailed`], where the mutation itself (capture,
/// undo, redo) already took effect and only the gated solve failed; the
/// previous good result remains readable.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The instrument pose carries a near-zero beam axis.
    #[error("instrument pose has a degenerate beam axis")]
    DegeneratePose,
    /// Landmark extraction failed on the frame.
    #[error(transparent)]
    Segmentation(#[from] SegmentError),
    #[error("no capture to undo")]
    NothingToUndo,
    #[error("no undone capture to redo")]
    NothingToRedo,
    /// The solve over the live captures failed; the last good result is kept.
    #[error("registration failed: {0}")]
    RegistrationFailed(#[from] RegisterError),
}

/// Session tuning. All fields have serde defaults, so a checkpoint or config
/// file only names what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Degrees of freedom solved for.
    pub mode: RegistrationMode,
    /// Convergence tolerance passed to the solver.
    pub tolerance: Real,
    /// Minimum captures before a solve is attempted. Default 5.
    pub solve_after: usize,
    /// Captures after which the result is considered stable enough to hand
    /// to the host. Default 15.
    pub publish_after: usize,
    /// Probe geometry for automatic extraction.
    pub geometry: ProbeGeometry,
    /// Segmentation tuning.
    pub segmentation: SegmentationConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: RegistrationMode::Similarity,
            tolerance: DEFAULT_TOLERANCE,
            solve_after: 5,
            publish_after: 15,
            geometry: ProbeGeometry::Linear,
            segmentation: SegmentationConfig::default(),
        }
    }
}

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No captures held.
    Empty,
    /// Captures held, but no registration available yet.
    Accumulating,
    /// A registration is available for the current capture set.
    Solved,
}

/// Interactive calibration session.
///
/// Undo and redo move whole captures between the live list and the redo
/// stack; a fresh capture invalidates the redo stack. The stored result is
/// recomputed from the live list after every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationSession {
    config: SessionConfig,
    captures: Vec<Correspondence>,
    redo_stack: Vec<Correspondence>,
    result: Option<RegistrationResult>,
    /// Total accepted captures over the session lifetime, undone or not.
    total_captures: u64,
}

impl CalibrationSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            captures: Vec::new(),
            redo_stack: Vec::new(),
            result: None,
            total_captures: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Live correspondence count.
    pub fn count(&self) -> usize {
        self.captures.len()
    }

    /// Live correspondences, oldest first.
    pub fn correspondences(&self) -> &[Correspondence] {
        &self.captures
    }

    /// Total accepted captures over the session lifetime.
    pub fn total_captures(&self) -> u64 {
        self.total_captures
    }

    pub fn state(&self) -> SessionState {
        if self.captures.is_empty() {
            SessionState::Empty
        } else if self.result.is_some() {
            SessionState::Solved
        } else {
            SessionState::Accumulating
        }
    }

    /// Most recent successful registration. Kept across a failed re-solve,
    /// cleared when the capture count drops below the solve gate.
    pub fn result(&self) -> Option<&RegistrationResult> {
        self.result.as_ref()
    }

    pub fn mean_error(&self) -> Option<Real> {
        self.result.as_ref().map(|r| r.mean_error)
    }

    /// Whether the result is ready to hand to the host.
    pub fn ready_to_publish(&self) -> bool {
        self.result.is_some() && self.captures.len() >= self.config.publish_after
    }

    /// Capture with automatic landmark extraction for the configured probe.
    pub fn capture_auto(
        &mut self,
        frame: &GrayFrame,
        pose: &Mat4,
    ) -> Result<SessionState, CaptureError> {
        let point = extract_automatic(frame, self.config.geometry, &self.config.segmentation)?;
        self.accept(point, pose)
    }

    /// Capture from an operator-placed marker.
    pub fn capture_manual(
        &mut self,
        frame: &GrayFrame,
        click: Pt2,
        pose: &Mat4,
    ) -> Result<SessionState, CaptureError> {
        let point = extract_manual(frame, click, &self.config.segmentation)?;
        self.accept(point, pose)
    }

    /// Capture a landmark the host already localized.
    pub fn capture_point(&mut self, point: Pt2, pose: &Mat4) -> Result<SessionState, CaptureError> {
        self.accept(point, pose)
    }

    fn accept(&mut self, point: Pt2, pose: &Mat4) -> Result<SessionState, CaptureError> {
        let line = Line3::from_pose(pose).ok_or(CaptureError::DegeneratePose)?;
        self.captures
            .push(Correspondence::new(image_point(&point), line));
        self.redo_stack.clear();
        self.total_captures += 1;
        debug!(
            "capture {} accepted ({} live)",
            self.total_captures,
            self.captures.len()
        );
        self.recompute()?;
        Ok(self.state())
    }

    pub fn can_undo(&self) -> bool {
        !self.captures.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Remove the newest capture and replay the solve without it.
    pub fn undo(&mut self) -> Result<SessionState, CaptureError> {
        let last = self.captures.pop().ok_or(CaptureError::NothingToUndo)?;
        self.redo_stack.push(last);
        self.recompute()?;
        Ok(self.state())
    }

    /// Restore the most recently undone capture.
    pub fn redo(&mut self) -> Result<SessionState, CaptureError> {
        let restored = self.redo_stack.pop().ok_or(CaptureError::NothingToRedo)?;
        self.captures.push(restored);
        self.recompute()?;
        Ok(self.state())
    }

    /// Drop all captures, history, and results.
    pub fn clear(&mut self) {
        self.captures.clear();
        self.redo_stack.clear();
        self.result = None;
    }

    /// Replay the solve over the live captures. On failure the previous good
    /// result is left in place and the solver error is returned.
    fn recompute(&mut self) -> Result<(), RegisterError> {
        if self.captures.len() < self.config.solve_after {
            self.result = None;
            return Ok(());
        }

        let mut solver =
            PointToLineRegistration::with_tolerance(self.config.mode, self.config.tolerance);
        for c in &self.captures {
            solver.add_point_and_line(c.point, c.line);
        }

        match solver.calculate_registration() {
            Ok(result) => {
                self.result = Some(result.clone());
                Ok(())
            }
            Err(err) => {
                warn!(
                    "registration failed over {} captures, keeping previous result: {err}",
                    self.captures.len()
                );
                Err(err)
            }
        }
    }

    /// Serialize the whole session for checkpointing.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Restore a checkpointed session. The solve is replayed so the result
    /// matches the restored captures even if the checkpoint was edited.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut session: Self = serde_json::from_str(json)?;
        // A checkpoint carries the last good result; if the replayed solve
        // fails the checkpointed result stands (the failure is logged).
        let _ = session.recompute();
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probecal_core::{compose_homogeneous, Mat3, Vec3};

    /// Pose whose beam axis is `direction` and whose line passes through
    /// `through` one unit up-beam.
    fn pose_through(direction: Vec3, through: Vec3) -> Mat4 {
        let d = direction.normalize();
        let seed = if d.x.abs() < 0.9 {
            Vec3::x()
        } else {
            Vec3::y()
        };
        let u = seed.cross(&d).normalize();
        let v = d.cross(&u);
        let rotation = Mat3::from_columns(&[u, v, d]);
        compose_homogeneous(&rotation, &(through - d))
    }

    /// Ground truth: rotation about z, uniform scale, offset.
    fn ground_truth() -> (Mat3, Real, Vec3) {
        let angle: Real = 0.3;
        let (s, c) = angle.sin_cos();
        let rotation = Mat3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0);
        (rotation, 0.08, Vec3::new(40.0, -12.0, 95.0))
    }

    fn capture_grid(session: &mut CalibrationSession, n: usize) {
        let (rotation, scale, offset) = ground_truth();
        for i in 0..n {
            let p = Pt2::new(40.0 + 55.0 * (i % 4) as Real, 30.0 + 60.0 * (i / 4) as Real);
            let q = rotation * (scale * image_point(&p)) + offset;
            let d = Vec3::new(
                0.2 * (i as Real).sin(),
                0.2 * (i as Real).cos(),
                1.0,
            );
            let pose = pose_through(d, q);
            session.capture_point(p, &pose).unwrap();
        }
    }

    fn test_config() -> SessionConfig {
        SessionConfig {
            publish_after: 10,
            ..Default::default()
        }
    }

    #[test]
    fn solve_gate_and_publish_gate() {
        let mut session = CalibrationSession::new(test_config());
        assert_eq!(session.state(), SessionState::Empty);

        capture_grid(&mut session, 4);
        assert_eq!(session.state(), SessionState::Accumulating);
        assert!(session.result().is_none());
        assert!(!session.ready_to_publish());

        capture_grid(&mut session, 12);
        assert_eq!(session.state(), SessionState::Solved);
        assert!(session.ready_to_publish());
        assert!(session.mean_error().unwrap() < 1e-6);
    }

    #[test]
    fn recovers_ground_truth_transform() {
        let (rotation, scale, offset) = ground_truth();
        let mut session = CalibrationSession::new(test_config());
        capture_grid(&mut session, 12);

        let result = session.result().unwrap();
        let probe = image_point(&Pt2::new(123.0, 45.0));
        let expected = rotation * (scale * probe) + offset;
        assert!((result.apply(&probe) - expected).norm() < 1e-6);
    }

    #[test]
    fn undo_clears_result_below_gate_and_redo_restores_it() {
        let mut session = CalibrationSession::new(test_config());
        capture_grid(&mut session, 5);
        assert_eq!(session.state(), SessionState::Solved);
        let solved = session.result().unwrap().clone();

        assert_eq!(session.undo().unwrap(), SessionState::Accumulating);
        assert!(session.result().is_none());
        assert!(session.can_redo());

        assert_eq!(session.redo().unwrap(), SessionState::Solved);
        let replayed = session.result().unwrap();
        assert!((replayed.transform - solved.transform).norm() < 1e-12);
        assert_eq!(session.count(), 5);
    }

    #[test]
    fn new_capture_invalidates_redo() {
        let mut session = CalibrationSession::new(test_config());
        capture_grid(&mut session, 6);
        session.undo().unwrap();
        assert!(session.can_redo());

        capture_grid(&mut session, 1);
        assert!(!session.can_redo());
        assert!(matches!(session.redo(), Err(CaptureError::NothingToRedo)));
    }

    #[test]
    fn clear_returns_to_empty_from_any_state() {
        let mut session = CalibrationSession::new(test_config());
        capture_grid(&mut session, 6);
        session.undo().unwrap();
        assert_eq!(session.state(), SessionState::Solved);

        session.clear();
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.count(), 0);
        assert!(session.result().is_none());
        assert!(!session.can_undo() && !session.can_redo());

        session.clear();
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn undo_on_empty_session_fails() {
        let mut session = CalibrationSession::new(test_config());
        assert!(matches!(session.undo(), Err(CaptureError::NothingToUndo)));
    }

    #[test]
    fn degenerate_pose_leaves_session_unchanged() {
        let mut session = CalibrationSession::new(test_config());
        capture_grid(&mut session, 3);

        // Zero rotation block: no beam axis to cast a line along.
        let mut bad_pose = Mat4::identity();
        bad_pose[(0, 0)] = 0.0;
        bad_pose[(1, 1)] = 0.0;
        bad_pose[(2, 2)] = 0.0;

        let err = session.capture_point(Pt2::new(1.0, 2.0), &bad_pose);
        assert!(matches!(err, Err(CaptureError::DegeneratePose)));
        assert_eq!(session.count(), 3);
        assert_eq!(session.total_captures(), 3);
    }

    #[test]
    fn solve_failure_surfaces_and_keeps_last_good_result() {
        let mut session = CalibrationSession::new(test_config());
        capture_grid(&mut session, 5);
        assert_eq!(session.state(), SessionState::Solved);
        let good = session.result().unwrap().clone();

        // A pose with a non-finite origin passes the beam-axis check but
        // breaks the gated solve.
        let mut pose = pose_through(Vec3::z(), Vec3::new(1.0, 2.0, 3.0));
        pose[(0, 3)] = Real::INFINITY;
        let err = session.capture_point(Pt2::new(5.0, 6.0), &pose);
        assert!(matches!(err, Err(CaptureError::RegistrationFailed(_))));

        // The capture itself was accepted; the previous result survives.
        assert_eq!(session.count(), 6);
        assert_eq!(session.total_captures(), 6);
        assert_eq!(session.result().unwrap().transform, good.transform);

        // Undoing the bad capture solves cleanly again.
        assert_eq!(session.undo().unwrap(), SessionState::Solved);
        let resolved = session.result().unwrap();
        assert!((resolved.transform - good.transform).norm() < 1e-12);
    }

    #[test]
    fn checkpoint_roundtrip_preserves_solution() {
        let mut session = CalibrationSession::new(test_config());
        capture_grid(&mut session, 8);
        let before = session.result().unwrap().clone();

        let json = session.to_json().unwrap();
        let restored = CalibrationSession::from_json(&json).unwrap();

        assert_eq!(restored.count(), 8);
        assert_eq!(restored.state(), SessionState::Solved);
        let after = restored.result().unwrap();
        assert!((after.transform - before.transform).norm() < 1e-12);
    }

    #[test]
    fn manual_capture_flows_through_bounds_check() {
        let mut session = CalibrationSession::new(test_config());
        let frame = GrayFrame::new(64, 48).unwrap();
        let pose = pose_through(Vec3::z(), Vec3::new(1.0, 2.0, 3.0));

        let state = session
            .capture_manual(&frame, Pt2::new(10.0, 20.0), &pose)
            .unwrap();
        assert_eq!(state, SessionState::Accumulating);
        assert_eq!(session.count(), 1);
    }
}
