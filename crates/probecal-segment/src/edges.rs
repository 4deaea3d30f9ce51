//! Sobel gradients and extremal-corner extraction.
//!
//! The curvilinear strategy needs the outline of the dominant component: a
//! 3x3 Sobel pass (border-clamped) marks high-gradient pixels, and the four
//! extremal corners of that outline are found by scanning for directional
//! extrema along the two image diagonals.

use probecal_core::{GrayFrame, Pt2};

use crate::components::ComponentMap;

const SOBEL_KERNEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Per-pixel Sobel gradient magnitude, same layout as the frame.
pub fn sobel_magnitude(frame: &GrayFrame) -> Vec<f64> {
    let (w, h) = (frame.w, frame.h);
    let mut mag = vec![0.0; w * h];

    for y in 0..h {
        let ys = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        for x in 0..w {
            let xs = [x.saturating_sub(1), x, (x + 1).min(w - 1)];
            let mut gx = 0.0;
            let mut gy = 0.0;
            for (ky, &yy) in ys.iter().enumerate() {
                for (kx, &xx) in xs.iter().enumerate() {
                    let v = frame.get(xx, yy) as f64;
                    gx += SOBEL_KERNEL_X[ky][kx] * v;
                    gy += SOBEL_KERNEL_Y[ky][kx] * v;
                }
            }
            mag[y * w + x] = (gx * gx + gy * gy).sqrt();
        }
    }
    mag
}

/// Four extremal corner points of a component outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerSet {
    pub top_left: Pt2,
    pub top_right: Pt2,
    pub bottom_left: Pt2,
    pub bottom_right: Pt2,
}

impl CornerSet {
    /// Midpoint of the bottom corner pair.
    pub fn bottom_midpoint(&self) -> Pt2 {
        Pt2::new(
            (self.bottom_left.x + self.bottom_right.x) / 2.0,
            (self.bottom_left.y + self.bottom_right.y) / 2.0,
        )
    }
}

/// Scan the high-gradient outline of a labeled component for its corners.
///
/// A pixel counts as outline when it belongs to the component and its Sobel
/// magnitude reaches `ratio` of the component's maximum. Corners are the
/// directional extrema of `x + y` and `x - y`; ties resolve to the first
/// pixel in raster order. Returns `None` when no outline pixel survives.
pub fn component_corners(
    mag: &[f64],
    map: &ComponentMap,
    label: u32,
    ratio: f64,
) -> Option<CornerSet> {
    let comp = map.components.get(label.checked_sub(1)? as usize)?;

    let mut max_mag = 0.0f64;
    for y in comp.min_y..=comp.max_y {
        for x in comp.min_x..=comp.max_x {
            if map.is_labeled(x, y, label) {
                max_mag = max_mag.max(mag[y * map.w + x]);
            }
        }
    }
    if max_mag <= 0.0 {
        return None;
    }
    let cut = max_mag * ratio;

    let mut tl: Option<(usize, usize)> = None;
    let mut tr: Option<(usize, usize)> = None;
    let mut bl: Option<(usize, usize)> = None;
    let mut br: Option<(usize, usize)> = None;

    for y in comp.min_y..=comp.max_y {
        for x in comp.min_x..=comp.max_x {
            if !map.is_labeled(x, y, label) || mag[y * map.w + x] < cut {
                continue;
            }
            let sum = x as i64 + y as i64;
            let dif = x as i64 - y as i64;

            if tl.map_or(true, |(px, py)| sum < px as i64 + py as i64) {
                tl = Some((x, y));
            }
            if tr.map_or(true, |(px, py)| dif > px as i64 - py as i64) {
                tr = Some((x, y));
            }
            if bl.map_or(true, |(px, py)| dif < px as i64 - py as i64) {
                bl = Some((x, y));
            }
            if br.map_or(true, |(px, py)| sum > px as i64 + py as i64) {
                br = Some((x, y));
            }
        }
    }

    let to_pt = |(x, y): (usize, usize)| Pt2::new(x as f64, y as f64);
    Some(CornerSet {
        top_left: to_pt(tl?),
        top_right: to_pt(tr?),
        bottom_left: to_pt(bl?),
        bottom_right: to_pt(br?),
    })
}
