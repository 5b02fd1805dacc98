//! Temporal smoothing of camera anchors.
//!
//! Anchors are compared slot by slot: slot `i` is the i-th anchor from the
//! left, not a tracked identity. When the number of anchors changes the
//! smoother snaps to the new observation instead of blending across layouts.

use reframe_models::{SceneMode, SceneObservation, TimelineRecord};

use super::config::FramingConfig;

/// Cross-frame state for one video.
///
/// Starts empty and is replaced once per processed frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerState {
    /// Stabilized anchors at full precision, `None` before the first frame.
    pub anchors: Option<Vec<f64>>,
    /// Mode that produced `anchors`.
    pub mode: SceneMode,
}

impl TrackerState {
    /// Build the emitted record for this state. Anchors are truncated toward zero.
    pub fn to_record(&self, frame_index: u64) -> TimelineRecord {
        let anchors = self
            .anchors
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|a| a.trunc() as i64)
            .collect();
        TimelineRecord::new(frame_index, self.mode, anchors)
    }
}

/// Dead-zone + EMA smoother.
#[derive(Debug, Clone, Copy)]
pub struct TemporalSmoother {
    dead_zone: f64,
    alpha: f64,
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self::from_config(&FramingConfig::default())
    }
}

impl TemporalSmoother {
    pub fn new(dead_zone: f64, alpha: f64) -> Self {
        Self { dead_zone, alpha }
    }

    pub fn from_config(config: &FramingConfig) -> Self {
        Self::new(config.dead_zone, config.smoothing_alpha)
    }

    /// Advance the tracker by one frame.
    pub fn step(&self, previous: TrackerState, observation: &SceneObservation, width: u32) -> TrackerState {
        let width = f64::from(width);

        let next = match (previous.anchors, observation.is_empty()) {
            // Nothing seen yet and nothing now: frame the middle.
            (None, true) => TrackerState {
                anchors: Some(vec![width / 2.0]),
                mode: SceneMode::Center,
            },
            // Lost everyone: hold the last layout.
            (Some(anchors), true) => TrackerState {
                anchors: Some(anchors),
                mode: previous.mode,
            },
            (None, false) => TrackerState {
                anchors: Some(observation.anchors.clone()),
                mode: observation.mode,
            },
            (Some(last), false) if last.len() != observation.anchors.len() => TrackerState {
                anchors: Some(observation.anchors.clone()),
                mode: observation.mode,
            },
            (Some(last), false) => {
                let threshold = self.dead_zone * width;
                let anchors = observation
                    .anchors
                    .iter()
                    .zip(&last)
                    .map(|(&current, &prev)| {
                        if (current - prev).abs() < threshold {
                            prev
                        } else {
                            self.alpha * current + (1.0 - self.alpha) * prev
                        }
                    })
                    .collect();
                TrackerState {
                    anchors: Some(anchors),
                    mode: observation.mode,
                }
            }
        };

        debug_assert!(
            next.anchors
                .as_ref()
                .is_some_and(|a| a.len() == next.mode.anchor_count()),
            "anchor count must match mode {:?}",
            next
        );
        debug_assert!(
            next.anchors
                .as_ref()
                .is_some_and(|a| a.windows(2).all(|w| w[0] <= w[1])),
            "anchors must be ordered left to right"
        );

        next
    }
}
