//! Mathematical utilities and type definitions.
//!
//! This module provides fundamental types used throughout the library and
//! small helpers for converting between isometries and homogeneous matrices.

use nalgebra::{Isometry3, Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 2D vector with [`Real`] components.
pub type Vec2 = Vector2<Real>;
/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 2D point with [`Real`] coordinates.
pub type Pt2 = Point2<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 4×4 matrix with [`Real`] entries.
pub type Mat4 = Matrix4<Real>;
/// 3D rigid transform (SE(3)) using [`Real`].
pub type Iso3 = Isometry3<Real>;

/// Lift a 2D image point into 3D on the image plane (`z = 0`).
///
/// Landmark points live in the ultrasound image plane; the registration
/// operates on 3D points, so the missing depth coordinate is fixed at zero.
pub fn image_point(p: &Pt2) -> Vec3 {
    Vec3::new(p.x, p.y, 0.0)
}

/// Build a 4×4 homogeneous matrix from a linear part and a translation.
pub fn compose_homogeneous(linear: &Mat3, translation: &Vec3) -> Mat4 {
    let mut m = Mat4::identity();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(linear);
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    m
}

/// Extract the translation column of a homogeneous matrix.
pub fn translation_of(m: &Mat4) -> Vec3 {
    Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

/// Extract basis column `k` (0..=2) of the rotation part of a homogeneous matrix.
pub fn basis_column(m: &Mat4, k: usize) -> Vec3 {
    Vec3::new(m[(0, k)], m[(1, k)], m[(2, k)])
}

/// Convert an isometry to a 4×4 homogeneous matrix.
pub fn iso_to_mat4(iso: &Iso3) -> Mat4 {
    iso.to_homogeneous()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};

    #[test]
    fn image_point_lifts_to_z0() {
        let p = image_point(&Pt2::new(3.0, -2.5));
        assert_eq!(p, Vec3::new(3.0, -2.5, 0.0));
    }

    #[test]
    fn compose_and_extract_roundtrip() {
        let linear = Mat3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let t = Vec3::new(1.0, 2.0, 3.0);
        let m = compose_homogeneous(&linear, &t);

        assert_eq!(translation_of(&m), t);
        assert_eq!(basis_column(&m, 0), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(basis_column(&m, 2), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(m[(3, 3)], 1.0);
    }

    #[test]
    fn iso_matches_homogeneous() {
        let iso = Iso3::from_parts(
            Translation3::new(1.0, -1.0, 0.5),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.3),
        );
        let m = iso_to_mat4(&iso);
        assert_eq!(translation_of(&m), Vec3::new(1.0, -1.0, 0.5));

        let p = Pt3::new(0.2, 0.4, -0.1);
        let via_iso = iso.transform_point(&p);
        let hp = m * p.to_homogeneous();
        assert!((via_iso.x - hp.x).abs() < 1e-12);
        assert!((via_iso.y - hp.y).abs() < 1e-12);
        assert!((via_iso.z - hp.z).abs() < 1e-12);
    }
}
