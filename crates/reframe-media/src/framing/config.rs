//! Framing engine tuning.

use serde::{Deserialize, Serialize};

/// Thresholds for the framing pipeline.
///
/// All ratios are relative to the frame: areas to `width * height`,
/// distances to `width`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramingConfig {
    /// Faces smaller than this fraction of the frame area are ignored (default: 0.01)
    pub min_face_area_ratio: f64,

    /// Two faces further apart than this fraction of the width are split (default: 0.25)
    pub split_threshold: f64,

    /// Anchor movement below this fraction of the width is ignored (default: 0.05)
    pub dead_zone: f64,

    /// EMA weight given to the new observation (default: 0.1)
    pub smoothing_alpha: f64,

    /// Analyze every Nth frame (default: 5)
    pub sample_interval: u64,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            min_face_area_ratio: 0.01,
            split_threshold: 0.25,
            dead_zone: 0.05,
            smoothing_alpha: 0.1,
            sample_interval: 5,
        }
    }
}

impl FramingConfig {
    /// Dead zone in pixels for a frame of the given width.
    #[inline]
    pub fn dead_zone_px(&self, width: f64) -> f64 {
        self.dead_zone * width
    }
}
