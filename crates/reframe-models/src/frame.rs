//! Raw video frames.

use thiserror::Error;

/// Bytes per pixel in an interleaved RGB24 buffer.
pub const BYTES_PER_PIXEL: usize = 3;

/// Errors raised when constructing a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },

    #[error("Frame buffer has {actual} bytes, expected {expected} for {width}x{height} RGB24")]
    BufferSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// An immutable RGB24 frame (row-major, 3 bytes per pixel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Create a frame, validating that the buffer matches the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyDimensions { width, height });
        }

        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            return Err(FrameError::BufferSizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self { width, height, data })
    }

    /// A black frame, used for detector warm-up.
    pub fn black(width: u32, height: u32) -> Result<Self, FrameError> {
        Self::new(width, height, vec![0; Self::byte_len(width, height)])
    }

    /// Number of bytes an RGB24 frame of the given size occupies.
    #[inline]
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Interleaved RGB bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_validates_buffer_length() {
        assert!(Frame::new(2, 2, vec![0; 12]).is_ok());

        let err = Frame::new(2, 2, vec![0; 11]).unwrap_err();
        assert_eq!(
            err,
            FrameError::BufferSizeMismatch {
                width: 2,
                height: 2,
                expected: 12,
                actual: 11
            }
        );
    }

    #[test]
    fn test_frame_rejects_empty_dimensions() {
        assert!(matches!(
            Frame::new(0, 10, Vec::new()),
            Err(FrameError::EmptyDimensions { .. })
        ));
    }

    #[test]
    fn test_black_frame() {
        let frame = Frame::black(4, 3).unwrap();
        assert_eq!(frame.data().len(), 36);
        assert!(frame.data().iter().all(|&b| b == 0));
    }
}
