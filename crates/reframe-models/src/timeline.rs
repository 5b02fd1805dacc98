//! Framing timeline records.

use serde::{Deserialize, Serialize};

use crate::scene::SceneMode;

/// One stabilized framing decision for a sampled frame.
///
/// Serialized as `{"frame": 0, "mode": "center", "centers": [640]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineRecord {
    /// Index in the original (unsampled) frame sequence
    #[serde(rename = "frame")]
    pub frame_index: u64,
    /// Scene layout for this frame
    pub mode: SceneMode,
    /// Stabilized anchors, truncated to whole pixels
    #[serde(rename = "centers")]
    pub anchors: Vec<i64>,
}

impl TimelineRecord {
    pub fn new(frame_index: u64, mode: SceneMode, anchors: Vec<i64>) -> Self {
        Self {
            frame_index,
            mode,
            anchors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_wire_format() {
        let record = TimelineRecord::new(15, SceneMode::Split, vec![100, 500]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"frame": 15, "mode": "split", "centers": [100, 500]})
        );
    }
}
