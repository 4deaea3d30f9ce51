//! Owned single-channel 8-bit frame buffer in row-major layout.
//!
//! Ultrasound frames arrive from the host as raw intensity grids; this buffer
//! holds one such frame for the duration of a single landmark extraction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame dimensions {w}x{h} do not match buffer length {len}")]
    DimensionMismatch { w: usize, h: usize, len: usize },
    #[error("frame has zero width or height")]
    Empty,
}

/// Owned grayscale intensity frame, row-major with `stride == width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    /// Frame width in pixels.
    pub w: usize,
    /// Frame height in pixels.
    pub h: usize,
    /// Backing storage in row-major order.
    pub data: Vec<u8>,
}

impl GrayFrame {
    /// Construct a zero-initialized frame of size `w × h`.
    pub fn new(w: usize, h: usize) -> Result<Self, FrameError> {
        if w == 0 || h == 0 {
            return Err(FrameError::Empty);
        }
        Ok(Self {
            w,
            h,
            data: vec![0; w * h],
        })
    }

    /// Wrap an existing intensity buffer.
    pub fn from_vec(w: usize, h: usize, data: Vec<u8>) -> Result<Self, FrameError> {
        if w == 0 || h == 0 {
            return Err(FrameError::Empty);
        }
        if data.len() != w * h {
            return Err(FrameError::DimensionMismatch {
                w,
                h,
                len: data.len(),
            });
        }
        Ok(Self { w, h, data })
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    #[inline]
    /// One row of pixels.
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }

    /// Whether a continuous image coordinate lies inside the frame.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.w as f64 && y < self.h as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_frame_is_zeroed() {
        let f = GrayFrame::new(4, 3).unwrap();
        assert_eq!(f.data.len(), 12);
        assert!(f.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn from_vec_validates_length() {
        assert!(GrayFrame::from_vec(2, 2, vec![0; 3]).is_err());
        assert!(GrayFrame::from_vec(2, 2, vec![0; 4]).is_ok());
        assert!(GrayFrame::from_vec(0, 2, vec![]).is_err());
    }

    #[test]
    fn get_set_row_major() {
        let mut f = GrayFrame::new(3, 2).unwrap();
        f.set(2, 1, 99);
        assert_eq!(f.get(2, 1), 99);
        assert_eq!(f.data[5], 99);
        assert_eq!(f.row(1), &[0, 0, 99]);
    }

    #[test]
    fn bounds_check() {
        let f = GrayFrame::new(10, 5).unwrap();
        assert!(f.contains(0.0, 0.0));
        assert!(f.contains(9.9, 4.9));
        assert!(!f.contains(10.0, 2.0));
        assert!(!f.contains(-0.1, 2.0));
    }
}
