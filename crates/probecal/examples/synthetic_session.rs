//! Interactive-style capture session on synthetic data.
//!
//! Simulates a freehand calibration sweep: a known ground-truth transform
//! generates one landmark/pose pair per capture, and the session is fed one
//! capture at a time, printing its state as the solve and publish gates are
//! crossed.
//!
//! Run with: `cargo run -p probecal --example synthetic_session`

use anyhow::Result;
use probecal::core::{compose_homogeneous, image_point, Mat3, Mat4, Vec3};
use probecal::prelude::*;

/// Pose whose beam axis is `direction`, with the line passing through
/// `through` one unit up-beam.
fn pose_through(direction: Vec3, through: Vec3) -> Mat4 {
    let d = direction.normalize();
    let u = Vec3::x().cross(&d).normalize();
    let v = d.cross(&u);
    compose_homogeneous(&Mat3::from_columns(&[u, v, d]), &(through - d))
}

fn main() -> Result<()> {
    println!("=== Freehand Probe Calibration (Synthetic) ===\n");

    // Ground truth: 0.3 rad in-plane rotation, 0.08 mm/px, offset in mm.
    let angle: Real = 0.3;
    let (s, c) = angle.sin_cos();
    let rotation_gt = Mat3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0);
    let scale_gt: Real = 0.08;
    let offset_gt = Vec3::new(40.0, -12.0, 95.0);

    println!("Ground truth:");
    println!("  rotation: {:.2} rad about z", angle);
    println!("  scale: {:.3} mm/px", scale_gt);
    println!("  offset: |t| = {:.1} mm\n", offset_gt.norm());

    let mut session = CalibrationSession::new(SessionConfig::default());

    for i in 0..18usize {
        let landmark = Pt2::new(
            40.0 + 55.0 * (i % 4) as Real,
            30.0 + 60.0 * ((i / 4) % 3) as Real,
        );
        let target = rotation_gt * (scale_gt * image_point(&landmark)) + offset_gt;
        let beam = Vec3::new(0.2 * (i as Real).sin(), 0.2 * (i as Real).cos(), 1.0);
        let pose = pose_through(beam, target);

        let state = session.capture_point(landmark, &pose)?;
        print!("capture {:2}: {:?}", i + 1, state);
        if let Some(err) = session.mean_error() {
            print!(" (mean error {:.2e} mm)", err);
        }
        if session.ready_to_publish() {
            print!("  <- ready to publish");
        }
        println!();
    }

    let result = session.result().expect("session solved");
    println!("\nSolved in {} iterations", result.iterations);
    println!("  scale: {:.4} mm/px (truth {:.4})", result.scale.x, scale_gt);
    println!(
        "  translation: ({:.2}, {:.2}, {:.2}) mm",
        result.translation.x, result.translation.y, result.translation.z
    );

    let probe = image_point(&Pt2::new(100.0, 50.0));
    let truth = rotation_gt * (scale_gt * probe) + offset_gt;
    println!(
        "  check point error: {:.2e} mm",
        (result.apply(&probe) - truth).norm()
    );

    Ok(())
}
