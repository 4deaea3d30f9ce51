//! High-level entry crate for the `probecal` ultrasound probe calibration
//! toolbox.
//!
//! Freehand probe calibration estimates the transform from image pixel
//! coordinates to the probe coordinate frame. Each capture pairs a landmark
//! point segmented from an ultrasound frame with the tracked pose of a
//! calibration instrument; the instrument's beam axis casts a 3D line, and
//! the solver finds the transform minimizing perpendicular point-to-line
//! distances over all captures.
//!
//! The usual entry point is the interactive session:
//!
//! ```no_run
//! use probecal::pipeline::{CalibrationSession, SessionConfig};
//! use probecal::core::{GrayFrame, Mat4};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = CalibrationSession::new(SessionConfig::default());
//!
//! let frame: GrayFrame = /* from the imaging host */
//! # GrayFrame::new(64, 48)?;
//! let pose: Mat4 = /* from the tracker */
//! # Mat4::identity();
//! session.capture_auto(&frame, &pose)?;
//!
//! if let Some(result) = session.result() {
//!     println!("mean error: {:.3} mm", result.mean_error);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The pieces are also usable on their own: [`segment`] turns frames into
//! landmark points, [`register`] solves point-to-line registration over an
//! explicit correspondence list, and [`pipeline::run_calibration`] replays a
//! recorded capture list in one shot.

pub mod core {
    pub use probecal_core::*;
}

pub mod segment {
    pub use probecal_segment::*;
}

pub mod register {
    pub use probecal_register::*;
}

pub mod pipeline {
    pub use probecal_pipeline::*;
}

pub mod prelude {
    //! Convenience re-exports for typical calibration workflows.
    pub use crate::core::{Correspondence, GrayFrame, Line3, Mat4, ProbeGeometry, Pt2, Real, Vec3};
    pub use crate::pipeline::{
        run_calibration, CalibrationInput, CalibrationReport, CalibrationSession, CaptureRecord,
        SessionConfig, SessionState,
    };
    pub use crate::register::{PointToLineRegistration, RegistrationMode, RegistrationResult};
    pub use crate::segment::{extract, ExtractionStrategy, SegmentationConfig};
}
