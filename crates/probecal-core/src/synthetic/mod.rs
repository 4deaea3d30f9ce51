//! Synthetic calibration data helpers.
//!
//! The functions here build deterministic image-space landmark grids and turn
//! a known ground-truth transform into point/line correspondences, so that
//! solver tests can check exact recovery.

use nalgebra::Rotation3;
use rand::Rng;

use crate::math::{Mat3, Real, Vec3};
use crate::types::{Correspondence, Line3};

/// A planar grid of landmark points on the image plane (`z = 0`).
///
/// Points are ordered deterministically in row-major order (y major).
pub fn image_grid(nx: usize, ny: usize, spacing: Real) -> Vec<Vec3> {
    let mut points = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            points.push(Vec3::new(i as Real * spacing, j as Real * spacing, 0.0));
        }
    }
    points
}

/// Rotation by `angle` radians around a (normalized) axis.
pub fn rotation_about(axis: Vec3, angle: Real) -> Mat3 {
    *Rotation3::new(axis.normalize() * angle).matrix()
}

/// Build exact correspondences for a known ground-truth transform.
///
/// Each image point `p` maps to `q = linear * p + translation`; a line with
/// direction `directions[i % directions.len()]` is laid through `q`, with its
/// origin backed off along the line by `back_off[i % back_off.len()]`. The
/// resulting set is noiseless: `q` lies exactly on its line.
///
/// Panics if `directions` or `back_off` is empty, or a direction is zero.
pub fn correspondences_from_transform(
    points: &[Vec3],
    linear: &Mat3,
    translation: &Vec3,
    directions: &[Vec3],
    back_off: &[Real],
) -> Vec<Correspondence> {
    assert!(!directions.is_empty() && !back_off.is_empty());
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let q = linear * p + translation;
            let dir = directions[i % directions.len()];
            let line = Line3::new(q - dir.normalize() * back_off[i % back_off.len()], dir)
                .expect("non-zero synthetic direction");
            Correspondence::new(*p, line)
        })
        .collect()
}

/// Perturb line origins perpendicular to their directions by up to `sigma`.
///
/// Displacing an origin along the line changes nothing; the perpendicular
/// component is what introduces residual error.
pub fn jitter_lines<R: Rng>(rng: &mut R, correspondences: &mut [Correspondence], sigma: Real) {
    for c in correspondences.iter_mut() {
        let noise = Vec3::new(
            rng.gen_range(-sigma..=sigma),
            rng.gen_range(-sigma..=sigma),
            rng.gen_range(-sigma..=sigma),
        );
        let perp = noise - c.line.direction * noise.dot(&c.line.direction);
        c.line.origin += perp;
    }
}
