//! Per-video framing engine.

use std::mem;

use reframe_models::{RawDetection, TimelineRecord};
use tracing::trace;

use super::config::FramingConfig;
use super::filter::filter_faces;
use super::smoother::{TemporalSmoother, TrackerState};
use super::topology::classify;

/// Turns per-frame detections into stabilized timeline records.
///
/// One engine owns the tracker state of exactly one video; analyze videos
/// concurrently with separate engines.
#[derive(Debug, Clone)]
pub struct FramingEngine {
    config: FramingConfig,
    smoother: TemporalSmoother,
    state: TrackerState,
}

impl Default for FramingEngine {
    fn default() -> Self {
        Self::new(FramingConfig::default())
    }
}

impl FramingEngine {
    pub fn new(config: FramingConfig) -> Self {
        Self {
            smoother: TemporalSmoother::from_config(&config),
            config,
            state: TrackerState::default(),
        }
    }

    /// Current tracker state.
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Process one sampled frame.
    pub fn process(
        &mut self,
        frame_index: u64,
        width: u32,
        height: u32,
        detections: &[RawDetection],
    ) -> TimelineRecord {
        let candidates = filter_faces(detections, width, height, self.config.min_face_area_ratio);
        let observation = classify(&candidates, width, self.config.split_threshold);

        self.state = self
            .smoother
            .step(mem::take(&mut self.state), &observation, width);

        let record = self.state.to_record(frame_index);
        trace!(
            "[FRAMING] frame {}: {} faces, {} kept, raw {} -> {} {:?}",
            frame_index,
            detections.len(),
            candidates.len(),
            observation.mode,
            record.mode,
            record.anchors
        );
        record
    }

    /// Forget everything seen so far.
    pub fn reset(&mut self) {
        self.state = TrackerState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_models::SceneMode;

    const W: u32 = 1000;
    const H: u32 = 1000;

    /// A 200x200 face centred at `center_x`.
    fn face_at(center_x: f64) -> RawDetection {
        RawDetection::new(center_x - 100.0, 100.0, 200.0, 200.0, 0.9)
    }

    #[test]
    fn test_scenario_dead_zone() {
        let mut engine = FramingEngine::default();
        let a = engine.process(0, W, H, &[face_at(500.0)]);
        let b = engine.process(5, W, H, &[face_at(503.0)]);
        assert_eq!(a.anchors, vec![500]);
        assert_eq!(b.anchors, vec![500]);
    }

    #[test]
    fn test_scenario_smoothing() {
        let mut engine = FramingEngine::default();
        engine.process(0, W, H, &[face_at(500.0)]);
        let b = engine.process(5, W, H, &[face_at(650.0)]);
        assert_eq!(b.mode, SceneMode::Center);
        assert_eq!(b.anchors, vec![515]);
    }

    #[test]
    fn test_scenario_split() {
        let mut engine = FramingEngine::default();
        let rec = engine.process(0, W, H, &[face_at(500.0), face_at(100.0)]);
        assert_eq!(rec.mode, SceneMode::Split);
        assert_eq!(rec.anchors, vec![100, 500]);
    }

    #[test]
    fn test_scenario_group() {
        let mut engine = FramingEngine::default();
        let rec = engine.process(0, W, H, &[face_at(400.0), face_at(500.0)]);
        assert_eq!(rec.mode, SceneMode::Group);
        assert_eq!(rec.anchors, vec![450]);
    }

    #[test]
    fn test_scenario_hold_after_loss() {
        let mut engine = FramingEngine::default();
        let mut records = Vec::new();
        for i in 0..5 {
            records.push(engine.process(i, W, H, &[face_at(400.0 + i as f64)]));
        }
        records.push(engine.process(5, W, H, &[]));

        assert_eq!(records[5].mode, records[4].mode);
        assert_eq!(records[5].anchors, records[4].anchors);
    }

    #[test]
    fn test_tiny_faces_behave_like_no_faces() {
        let mut engine = FramingEngine::default();
        let speck = RawDetection::new(10.0, 10.0, 5.0, 5.0, 0.99);
        let rec = engine.process(0, W, H, &[speck]);
        assert_eq!(rec.anchors, vec![500]);
    }

    #[test]
    fn test_anchor_count_matches_mode() {
        let mut engine = FramingEngine::default();
        let frames: Vec<Vec<RawDetection>> = vec![
            vec![],
            vec![face_at(300.0)],
            vec![face_at(100.0), face_at(900.0)],
            vec![],
            vec![face_at(480.0), face_at(520.0)],
            vec![face_at(200.0), face_at(210.0), face_at(800.0)],
        ];
        for (i, dets) in frames.iter().enumerate() {
            let rec = engine.process(i as u64 * 5, W, H, dets);
            assert_eq!(rec.anchors.len(), rec.mode.anchor_count(), "frame {}", i);
            assert!(rec.anchors.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_reset_clears_state() {
        let mut engine = FramingEngine::default();
        engine.process(0, W, H, &[face_at(100.0)]);
        engine.reset();
        assert_eq!(engine.state(), &TrackerState::default());
        let rec = engine.process(0, W, H, &[]);
        assert_eq!(rec.anchors, vec![500]);
    }
}
