//! Depth frame container

use crate::error::{Error, Result};
use std::sync::Arc;

/// Sample value a sensor reports for a pixel with no return
pub const INVALID_DEPTH: u16 = 0;

/// One acquisition of per-pixel distances from the sensor
///
/// Samples are stored row-major in millimetres. The sample buffer is shared,
/// so cloning a frame never copies pixel data.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    width: usize,
    height: usize,
    sequence: u64,
    data: Arc<[u16]>,
}

impl DepthFrame {
    /// Create a frame, checking that the buffer matches the dimensions
    pub fn new(width: usize, height: usize, data: Vec<u16>) -> Result<Self> {
        Self::with_sequence(width, height, 0, data)
    }

    /// Create a frame tagged with the sensor's acquisition counter
    pub fn with_sequence(width: usize, height: usize, sequence: u64, data: Vec<u16>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::InvalidData(format!(
                "depth frame of {}x{} needs {} samples, got {}",
                width,
                height,
                width * height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            sequence,
            data: data.into(),
        })
    }

    /// A frame where every pixel reads `value`
    pub fn filled(width: usize, height: usize, value: u16) -> Self {
        Self {
            width,
            height,
            sequence: 0,
            data: vec![value; width * height].into(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn samples(&self) -> &[u16] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u16 {
        self.data[y * self.width + x]
    }

    /// Whether two frames share dimensions
    pub fn same_shape(&self, other: &DepthFrame) -> bool {
        self.width == other.width && self.height == other.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rejects_wrong_length() {
        let result = DepthFrame::new(4, 4, vec![0; 15]);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_frame_row_major_access() {
        let frame = DepthFrame::new(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(frame.get(0, 0), 1);
        assert_eq!(frame.get(2, 0), 3);
        assert_eq!(frame.get(0, 1), 4);
        assert_eq!(frame.get(2, 1), 6);
    }

    #[test]
    fn test_clone_shares_samples() {
        let frame = DepthFrame::with_sequence(2, 2, 7, vec![9; 4]).unwrap();
        let copy = frame.clone();
        assert_eq!(copy.sequence(), 7);
        assert!(std::ptr::eq(frame.samples().as_ptr(), copy.samples().as_ptr()));
    }
}
