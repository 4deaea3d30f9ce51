//! Core types for the `probecal` ultrasound probe calibration toolbox.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, `Pt2`, ...),
//! - observation value types ([`Correspondence`], [`Line3`], [`ProbeGeometry`]),
//! - an owned grayscale frame buffer ([`GrayFrame`]),
//! - synthetic data generators for tests and examples.
//!
//! Calibration data flow:
//! `frame -> landmark point (image space) + instrument pose -> correspondence`
//!
//! The solver and segmentation crates consume these types; no scene-graph or
//! host-application concepts appear here.

/// Linear algebra type aliases and helpers.
pub mod math;
/// Observation and probe geometry value types.
pub mod types;
/// Owned grayscale frame buffer.
pub mod frame;
/// Synthetic correspondence generators.
pub mod synthetic;

pub use frame::*;
pub use math::*;
pub use types::*;
