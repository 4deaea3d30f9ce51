//! Automatic landmark extraction on a synthetic ultrasound frame.
//!
//! Renders a bright needle echo into a dark speckled frame and runs the
//! linear-probe segmentation pipeline on it, printing the threshold decision
//! and the extracted landmark.
//!
//! Run with: `cargo run -p probecal --example segment_frame`

use anyhow::Result;
use probecal::core::{GrayFrame, ProbeGeometry};
use probecal::segment::{extract_automatic, extract_manual, SegmentationConfig};
use probecal::prelude::*;

fn main() -> Result<()> {
    // 64x48 frame: dim speckle background plus one bright 12x6 echo.
    let mut frame = GrayFrame::new(64, 48)?;
    for i in 0..frame.data.len() {
        frame.data[i] = ((i * 13) % 31) as u8;
    }
    for y in 18..24 {
        for x in 20..32 {
            frame.set(x, y, 215);
        }
    }

    let config = SegmentationConfig::default();

    let auto = extract_automatic(&frame, ProbeGeometry::Linear, &config)?;
    println!("automatic landmark: ({:.1}, {:.1}) px", auto.x, auto.y);

    // An operator click outside the frame is clamped onto it by default.
    let clicked = extract_manual(&frame, Pt2::new(80.0, 20.0), &config)?;
    println!("clamped click:      ({:.1}, {:.1}) px", clicked.x, clicked.y);

    Ok(())
}
