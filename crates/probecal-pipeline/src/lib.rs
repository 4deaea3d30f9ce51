//! Capture session and batch calibration workflow.
//!
//! The interactive path is [`CalibrationSession`]: the host feeds it one
//! frame-and-pose pair per capture, and the session keeps the correspondence
//! list, the undo/redo history, and the current registration result
//! consistent with each other. The batch path is [`run_calibration`], which
//! replays a recorded capture list through a fresh session and emits a JSON
//! friendly report.

/// One-shot calibration over a recorded capture list.
pub mod run;
/// Interactive capture session with undo/redo.
pub mod session;

pub use run::{
    run_calibration, CalibrationInput, CalibrationReport, CalibrationRunError, CaptureRecord,
};
pub use session::{CalibrationSession, CaptureError, SessionConfig, SessionState};
