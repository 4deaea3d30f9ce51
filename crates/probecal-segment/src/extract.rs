//! Extraction strategies behind a single `extract` contract.

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use probecal_core::{GrayFrame, ProbeGeometry, Pt2, Real};

use crate::components::{label_components, Component, Connectivity};
use crate::edges::{component_corners, sobel_magnitude};
use crate::otsu::{histogram, otsu_threshold};

/// Extraction failures reported to the operator. None of these mutate any
/// registration state; the caller skips the capture and retries.
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("no usable foreground signal found in frame")]
    NoSignalFound,
    #[error("point ({x:.1}, {y:.1}) lies outside the frame")]
    OutOfBounds { x: Real, y: Real },
    #[error("frame is not a single-line A-mode trace ({w}x{h})")]
    NotATrace { w: usize, h: usize },
    #[error("regressor rejected frame: {0}")]
    Regressor(String),
}

/// What to do with a manual click outside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutOfBoundsPolicy {
    /// Clamp the click onto the nearest frame pixel.
    #[default]
    Clamp,
    /// Reject the capture with [`SegmentError::OutOfBounds`].
    Reject,
}

/// Tunable segmentation parameters.
///
/// These varied across tuning iterations of the source system, so they are
/// configuration rather than constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Multiplicative bias applied to the Otsu threshold estimate.
    pub threshold_scale: Real,
    /// Connectivity used for component labeling.
    pub connectivity: Connectivity,
    /// Pixels subtracted from the landmark row to compensate edge-detection
    /// bias on linear probes.
    pub tip_offset_px: Real,
    /// Weight of the geometric apex in the curvilinear blend; the remainder
    /// goes to the bottom midpoint.
    pub apex_blend: Real,
    /// Components smaller than this are treated as speckle.
    pub min_component_px: usize,
    /// Outline pixels must reach this fraction of the component's peak
    /// gradient magnitude.
    pub edge_magnitude_ratio: Real,
    /// Manual-click bounds policy; fixed per session.
    pub out_of_bounds: OutOfBoundsPolicy,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            threshold_scale: 1.6,
            connectivity: Connectivity::Eight,
            tip_offset_px: 4.0,
            apex_blend: 0.7,
            min_component_px: 8,
            edge_magnitude_ratio: 0.25,
            out_of_bounds: OutOfBoundsPolicy::Clamp,
        }
    }
}

/// A learned point regressor usable in place of the geometric pipeline.
///
/// The frame is resampled to [`input_size`](PointRegressor::input_size)
/// before inference; the regressed point is normalized to `[0, 1]` in both
/// axes and mapped back to pixel coordinates by the caller.
pub trait PointRegressor {
    /// Expected input resolution `(w, h)`.
    fn input_size(&self) -> (usize, usize);
    /// Regress the normalized landmark location from a resampled frame.
    fn regress(&self, frame: &GrayFrame) -> Result<Pt2, SegmentError>;
}

/// How one capture locates its landmark.
pub enum ExtractionStrategy<'a> {
    /// Operator-placed marker.
    Manual { click: Pt2 },
    /// Threshold + component geometry for the given probe.
    Automatic { geometry: ProbeGeometry },
    /// Learned point regressor.
    Learned { model: &'a dyn PointRegressor },
}

/// Single entry point: one frame in, one landmark point out.
pub fn extract(
    frame: &GrayFrame,
    strategy: &ExtractionStrategy<'_>,
    config: &SegmentationConfig,
) -> Result<Pt2, SegmentError> {
    match strategy {
        ExtractionStrategy::Manual { click } => extract_manual(frame, *click, config),
        ExtractionStrategy::Automatic { geometry } => extract_automatic(frame, *geometry, config),
        ExtractionStrategy::Learned { model } => extract_with_model(frame, *model),
    }
}

/// Validate an operator click against the frame bounds.
pub fn extract_manual(
    frame: &GrayFrame,
    click: Pt2,
    config: &SegmentationConfig,
) -> Result<Pt2, SegmentError> {
    if frame.contains(click.x, click.y) {
        return Ok(click);
    }
    match config.out_of_bounds {
        OutOfBoundsPolicy::Clamp => Ok(Pt2::new(
            click.x.clamp(0.0, frame.w as Real - 1.0),
            click.y.clamp(0.0, frame.h as Real - 1.0),
        )),
        OutOfBoundsPolicy::Reject => Err(SegmentError::OutOfBounds {
            x: click.x,
            y: click.y,
        }),
    }
}

/// Automatic landmark localization for the given probe geometry.
pub fn extract_automatic(
    frame: &GrayFrame,
    geometry: ProbeGeometry,
    config: &SegmentationConfig,
) -> Result<Pt2, SegmentError> {
    match geometry {
        ProbeGeometry::Linear => linear_landmark(frame, config),
        ProbeGeometry::Curvilinear { beam_half_angle } => {
            curvilinear_landmark(frame, beam_half_angle, config)
        }
        ProbeGeometry::AMode => amode_landmark(frame, config),
    }
}

/// Run a learned regressor: resample to its input shape, infer, de-normalize.
pub fn extract_with_model(
    frame: &GrayFrame,
    model: &dyn PointRegressor,
) -> Result<Pt2, SegmentError> {
    let (mw, mh) = model.input_size();
    if mw == 0 || mh == 0 {
        return Err(SegmentError::Regressor(format!(
            "degenerate input size {mw}x{mh}"
        )));
    }
    let resampled = resample_nearest(frame, mw, mh);
    let normalized = model.regress(&resampled)?;
    Ok(Pt2::new(
        normalized.x * frame.w as Real,
        normalized.y * frame.h as Real,
    ))
}

fn binary_mask(frame: &GrayFrame, config: &SegmentationConfig) -> Vec<bool> {
    let base = otsu_threshold(&histogram(frame)) as Real;
    let threshold = (base * config.threshold_scale).min(255.0);
    debug!(
        "segmenting with threshold {:.1} (otsu {:.0} x {})",
        threshold, base, config.threshold_scale
    );
    frame
        .data
        .iter()
        .map(|&v| v as Real > threshold)
        .collect()
}

/// Linear probe: the needle cross-section is the larger of the two dominant
/// bright components. Landmark x is the midpoint of its column span; y is the
/// midpoint of its row span lifted by the tip offset.
fn linear_landmark(frame: &GrayFrame, config: &SegmentationConfig) -> Result<Pt2, SegmentError> {
    let mask = binary_mask(frame, config);
    let map = label_components(&mask, frame.w, frame.h, config.connectivity);
    let ranked = map.ranked(config.min_component_px);

    let dominant: &Component = ranked.first().ok_or(SegmentError::NoSignalFound)?;
    if ranked.len() > 1 {
        debug!(
            "linear segmentation: dominant {} px, runner-up {} px",
            dominant.pixel_count,
            ranked[1].pixel_count
        );
    }

    let x = dominant.center_x();
    let y = (dominant.center_y() - config.tip_offset_px).max(0.0);
    Ok(Pt2::new(x, y))
}

/// Curvilinear probe: corners of the dominant wedge outline give a geometric
/// apex, blended with the bottom midpoint.
fn curvilinear_landmark(
    frame: &GrayFrame,
    beam_half_angle: Real,
    config: &SegmentationConfig,
) -> Result<Pt2, SegmentError> {
    let mask = binary_mask(frame, config);
    let map = label_components(&mask, frame.w, frame.h, config.connectivity);
    let ranked = map.ranked(config.min_component_px);
    let dominant = ranked.first().ok_or(SegmentError::NoSignalFound)?;

    let mag = sobel_magnitude(frame);
    let corners = component_corners(&mag, &map, dominant.label, config.edge_magnitude_ratio)
        .ok_or(SegmentError::NoSignalFound)?;

    let bottom_mid = corners.bottom_midpoint();
    let apex = apex_estimate(&corners, bottom_mid, beam_half_angle);

    let w = config.apex_blend;
    let x = w * apex.x + (1.0 - w) * bottom_mid.x;
    let y = w * apex.y + (1.0 - w) * bottom_mid.y;
    Ok(Pt2::new(
        x.clamp(0.0, frame.w as Real - 1.0),
        y.clamp(0.0, frame.h as Real - 1.0),
    ))
}

/// Intersect the top-corner line with the beam-center line through the
/// bottom midpoint. Falls back to backing off along the beam axis by the
/// half-span over `tan(half_angle)` when the top pair is degenerate.
fn apex_estimate(corners: &crate::edges::CornerSet, bottom_mid: Pt2, beam_half_angle: Real) -> Pt2 {
    let dx = corners.top_right.x - corners.top_left.x;
    if dx.abs() > 1e-9 {
        let slope = (corners.top_right.y - corners.top_left.y) / dx;
        let y = corners.top_left.y + slope * (bottom_mid.x - corners.top_left.x);
        return Pt2::new(bottom_mid.x, y);
    }

    let half_span = (corners.bottom_right.x - corners.bottom_left.x).abs() / 2.0;
    let tan = beam_half_angle.tan();
    if tan.abs() > 1e-9 {
        Pt2::new(bottom_mid.x, (bottom_mid.y - half_span / tan).max(0.0))
    } else {
        bottom_mid
    }
}

/// A-mode trace: the landmark is the strongest echo sample along the single
/// scan line, provided it clears the biased threshold.
fn amode_landmark(frame: &GrayFrame, config: &SegmentationConfig) -> Result<Pt2, SegmentError> {
    if frame.h != 1 && frame.w != 1 {
        return Err(SegmentError::NotATrace {
            w: frame.w,
            h: frame.h,
        });
    }

    let base = otsu_threshold(&histogram(frame)) as Real;
    let threshold = (base * config.threshold_scale).min(255.0);

    let mut peak: Option<(usize, u8)> = None;
    for (i, &v) in frame.data.iter().enumerate() {
        if (v as Real) > threshold && peak.map_or(true, |(_, pv)| v > pv) {
            peak = Some((i, v));
        }
    }
    let (i, _) = peak.ok_or(SegmentError::NoSignalFound)?;

    if frame.h == 1 {
        Ok(Pt2::new(i as Real, 0.0))
    } else {
        Ok(Pt2::new(0.0, i as Real))
    }
}

fn resample_nearest(frame: &GrayFrame, w: usize, h: usize) -> GrayFrame {
    let mut data = Vec::with_capacity(w * h);
    for y in 0..h {
        let sy = (y * frame.h) / h;
        for x in 0..w {
            let sx = (x * frame.w) / w;
            data.push(frame.get(sx, sy));
        }
    }
    GrayFrame { w, h, data }
}
