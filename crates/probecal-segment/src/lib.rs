//! Landmark extraction: map one ultrasound frame to one 2D point.
//!
//! Each capture feeds exactly one frame through an extraction strategy and
//! produces one landmark point in image pixel coordinates, or a
//! [`SegmentError`] the caller reports to the operator. Extraction is a pure
//! function of the frame and the [`SegmentationConfig`]; it never touches the
//! registration state.
//!
//! Strategies:
//! - manual: a clicked point, validated against the frame bounds,
//! - automatic: threshold + connected components + per-probe geometry
//!   (linear, curvilinear wedge, A-mode trace),
//! - learned: any [`PointRegressor`] behind the same contract.

mod components;
mod edges;
mod extract;
mod otsu;

pub use components::{label_components, Component, ComponentMap, Connectivity};
pub use edges::{component_corners, sobel_magnitude, CornerSet};
pub use extract::{
    extract, extract_automatic, extract_manual, extract_with_model, ExtractionStrategy,
    OutOfBoundsPolicy, PointRegressor, SegmentError, SegmentationConfig,
};
pub use otsu::{histogram, otsu_threshold};
