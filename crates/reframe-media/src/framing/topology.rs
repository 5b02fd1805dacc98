//! Scene topology classification.

use reframe_models::SceneObservation;

use super::filter::FaceCandidate;

/// Classify a frame from its filtered candidates (largest first).
///
/// Only the two largest faces matter. They are split when their horizontal
/// distance exceeds `split_threshold` of the width, otherwise framed as a group.
pub fn classify(candidates: &[FaceCandidate], width: u32, split_threshold: f64) -> SceneObservation {
    debug_assert!(
        candidates.windows(2).all(|w| w[0].area >= w[1].area),
        "candidates must be sorted by area"
    );

    match candidates {
        [] => SceneObservation::empty(),
        [only] => SceneObservation::center(only.center_x),
        [primary, secondary, ..] => {
            let dist_ratio = (primary.center_x - secondary.center_x).abs() / f64::from(width);
            if dist_ratio > split_threshold {
                SceneObservation::split(primary.center_x, secondary.center_x)
            } else {
                SceneObservation::group((primary.center_x + secondary.center_x) / 2.0)
            }
        }
    }
}
