//! Otsu global threshold estimation.
//!
//! Picks the threshold maximizing between-class variance of the intensity
//! histogram. Deterministic: the lowest maximizing bin wins.

use probecal_core::GrayFrame;

/// 256-bin intensity histogram of a frame.
pub fn histogram(frame: &GrayFrame) -> [usize; 256] {
    let mut hist = [0usize; 256];
    for &v in &frame.data {
        hist[v as usize] += 1;
    }
    hist
}

/// Otsu threshold over a 256-bin histogram.
///
/// Returns the bin `t` such that classifying `v > t` as foreground maximizes
/// the between-class variance. A flat or empty histogram yields 0.
pub fn otsu_threshold(hist: &[usize; 256]) -> u8 {
    let total: usize = hist.iter().sum();
    if total == 0 {
        return 0;
    }

    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(v, &c)| v as f64 * c as f64)
        .sum();

    let mut weight_bg = 0.0;
    let mut sum_bg = 0.0;
    let mut best_t = 0u8;
    let mut best_var = 0.0;

    for t in 0..256usize {
        weight_bg += hist[t] as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total as f64 - weight_bg;
        if weight_fg == 0.0 {
            break;
        }

        sum_bg += t as f64 * hist[t] as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let diff = mean_bg - mean_fg;
        let var = weight_bg * weight_fg * diff * diff;

        if var > best_var {
            best_var = var;
            best_t = t as u8;
        }
    }

    best_t
}
