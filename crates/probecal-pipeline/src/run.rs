//! One-shot calibration over a recorded capture list.
//!
//! This is the batch counterpart of [`CalibrationSession`](crate::session):
//! the host records landmark points and instrument poses during a sweep, and
//! the whole list is replayed through a fresh session afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use probecal_core::{Mat4, Pt2, Real};
use probecal_register::RegistrationMode;

use crate::session::{CalibrationSession, CaptureError, SessionConfig};

/// One recorded capture: an already-localized landmark and the instrument
/// pose at the same instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRecord {
    /// Landmark in image pixel coordinates.
    pub point: Pt2,
    /// Homogeneous instrument pose in tracker coordinates.
    pub pose: Mat4,
}

/// Input to [`run_calibration`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationInput {
    pub captures: Vec<CaptureRecord>,
}

/// Final calibration report, JSON-serializable for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub mode: RegistrationMode,
    /// Captures that contributed to the solve.
    pub captures: usize,
    /// Homogeneous image-to-probe transform.
    pub transform: Mat4,
    pub mean_error: Real,
    pub rms_error: Real,
    pub iterations: usize,
    /// Whether the capture count reached the configured publish gate.
    pub ready_to_publish: bool,
}

/// Errors from the batch pipeline.
#[derive(Debug, Error)]
pub enum CalibrationRunError {
    #[error("no captures provided")]
    EmptyCaptures,
    #[error(
        "only {got} captures, but a solve is gated behind {needed}; record more sweeps"
    )]
    NotEnoughCaptures { got: usize, needed: usize },
    #[error("capture {index} rejected: {source}")]
    BadCapture {
        index: usize,
        #[source]
        source: CaptureError,
    },
    #[error("captures held, but registration did not solve")]
    SolveFailed,
}

/// Replay a recorded capture list and report the resulting registration.
pub fn run_calibration(
    input: &CalibrationInput,
    config: &SessionConfig,
) -> Result<CalibrationReport, CalibrationRunError> {
    if input.captures.is_empty() {
        return Err(CalibrationRunError::EmptyCaptures);
    }
    if input.captures.len() < config.solve_after {
        return Err(CalibrationRunError::NotEnoughCaptures {
            got: input.captures.len(),
            needed: config.solve_after,
        });
    }

    let mut session = CalibrationSession::new(config.clone());
    let mut solve_failed = false;
    for (index, capture) in input.captures.iter().enumerate() {
        match session.capture_point(capture.point, &capture.pose) {
            Ok(_) => solve_failed = false,
            // The capture was accepted; only the gated solve failed. That
            // matters only if it is still failing after the last capture.
            Err(CaptureError::RegistrationFailed(_)) => solve_failed = true,
            Err(source) => return Err(CalibrationRunError::BadCapture { index, source }),
        }
    }
    if solve_failed {
        return Err(CalibrationRunError::SolveFailed);
    }

    let result = session.result().ok_or(CalibrationRunError::SolveFailed)?;
    Ok(CalibrationReport {
        mode: config.mode,
        captures: session.count(),
        transform: result.transform,
        mean_error: result.mean_error,
        rms_error: result.rms_error,
        iterations: result.iterations,
        ready_to_publish: session.ready_to_publish(),
    })
}
