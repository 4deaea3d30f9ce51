//! End-to-end session test over synthetic frames.
//!
//! Renders a bright needle echo into otherwise dark frames, runs automatic
//! linear-probe extraction through a capture session, and checks that the
//! session recovers the transform the frames were generated with.

use probecal_core::{compose_homogeneous, image_point, GrayFrame, Mat3, Mat4, Pt2, Real, Vec3};
use probecal_pipeline::{CalibrationSession, SessionConfig, SessionState};

const TIP_OFFSET: Real = 4.0;

fn ground_truth() -> (Mat3, Real, Vec3) {
    let angle: Real = 0.25;
    let (s, c) = angle.sin_cos();
    let rotation = Mat3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0);
    (rotation, 0.1, Vec3::new(15.0, -8.0, 110.0))
}

/// A frame whose automatic linear-probe landmark is `(cx, cy - TIP_OFFSET)`.
fn frame_with_echo(cx: usize, cy: usize) -> GrayFrame {
    let mut frame = GrayFrame::new(64, 48).unwrap();
    for y in cy - 2..=cy + 2 {
        for x in cx - 3..=cx + 3 {
            frame.set(x, y, 220);
        }
    }
    frame
}

fn pose_through(direction: Vec3, through: Vec3) -> Mat4 {
    let d = direction.normalize();
    let u = Vec3::x().cross(&d).normalize();
    let v = d.cross(&u);
    compose_homogeneous(&Mat3::from_columns(&[u, v, d]), &(through - d))
}

#[test]
fn automatic_sweep_recovers_transform() {
    let (rotation, scale, offset) = ground_truth();
    let echoes: [(usize, usize); 6] = [(10, 10), (30, 12), (50, 14), (12, 30), (32, 34), (52, 40)];

    let mut session = CalibrationSession::new(SessionConfig::default());

    for (i, &(cx, cy)) in echoes.iter().enumerate() {
        let frame = frame_with_echo(cx, cy);
        let landmark = Pt2::new(cx as Real, cy as Real - TIP_OFFSET);
        let q = rotation * (scale * image_point(&landmark)) + offset;
        let d = Vec3::new(0.1, 0.15 * (i as Real).sin(), 1.0);
        let pose = pose_through(d, q);

        let state = session.capture_auto(&frame, &pose).unwrap();
        if i + 1 < session.config().solve_after {
            assert_eq!(state, SessionState::Accumulating);
        } else {
            assert_eq!(state, SessionState::Solved);
        }
    }

    let result = session.result().expect("session solved");
    assert!(result.mean_error < 1e-6, "mean {}", result.mean_error);

    let probe = image_point(&Pt2::new(20.0, 33.0));
    let expected = rotation * (scale * probe) + offset;
    assert!((result.apply(&probe) - expected).norm() < 1e-6);
}

#[test]
fn undone_sweep_replays_to_the_same_result() {
    let (rotation, scale, offset) = ground_truth();
    let echoes: [(usize, usize); 7] =
        [(10, 10), (30, 12), (50, 14), (12, 30), (32, 34), (52, 40), (22, 22)];

    let mut session = CalibrationSession::new(SessionConfig::default());
    for (i, &(cx, cy)) in echoes.iter().enumerate() {
        let frame = frame_with_echo(cx, cy);
        let landmark = Pt2::new(cx as Real, cy as Real - TIP_OFFSET);
        let q = rotation * (scale * image_point(&landmark)) + offset;
        let pose = pose_through(Vec3::new(0.1, 0.1 * (i as Real).cos(), 1.0), q);
        session.capture_auto(&frame, &pose).unwrap();
    }
    let full = session.result().unwrap().clone();

    session.undo().unwrap();
    session.undo().unwrap();
    assert_eq!(session.count(), 5);
    session.redo().unwrap();
    session.redo().unwrap();

    let replayed = session.result().unwrap();
    assert_eq!(session.count(), 7);
    assert!((replayed.transform - full.transform).norm() < 1e-12);
}
