//! Face detections in original-frame pixel coordinates.

use serde::{Deserialize, Serialize};

/// Number of facial landmarks reported per detection
/// (right eye, left eye, nose tip, right mouth corner, left mouth corner).
pub const LANDMARK_COUNT: usize = 5;

/// A single facial landmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A face detection as returned by the detector service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
    /// Detection confidence in [0, 1]
    pub confidence: f64,
    /// Facial landmarks
    pub landmarks: [Landmark; LANDMARK_COUNT],
}

impl RawDetection {
    /// Create a detection without landmarks.
    pub fn new(x: f64, y: f64, width: f64, height: f64, confidence: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
            landmarks: [Landmark::default(); LANDMARK_COUNT],
        }
    }

    /// Attach landmarks.
    pub fn with_landmarks(mut self, landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        self.landmarks = landmarks;
        self
    }

    /// Center x-coordinate.
    #[inline]
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}
