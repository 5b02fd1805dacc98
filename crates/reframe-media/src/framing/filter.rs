//! Face filtering.

use reframe_models::RawDetection;

/// A detection reduced to what the classifier needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceCandidate {
    pub center_x: f64,
    pub area: f64,
}

impl From<&RawDetection> for FaceCandidate {
    fn from(det: &RawDetection) -> Self {
        Self {
            center_x: det.center_x(),
            area: det.area(),
        }
    }
}

/// Drop faces smaller than `min_area_ratio` of the frame and sort the rest
/// largest first.
///
/// Equal areas keep detection order. Confidence is not considered here; the
/// detector has already applied its threshold.
pub fn filter_faces(
    detections: &[RawDetection],
    width: u32,
    height: u32,
    min_area_ratio: f64,
) -> Vec<FaceCandidate> {
    let min_area = min_area_ratio * f64::from(width) * f64::from(height);

    let mut candidates: Vec<FaceCandidate> = detections
        .iter()
        .map(FaceCandidate::from)
        .filter(|c| c.area >= min_area)
        .collect();

    // sort_by is stable
    candidates.sort_by(|a, b| b.area.total_cmp(&a.area));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(x: f64, w: f64, h: f64) -> RawDetection {
        RawDetection::new(x, 0.0, w, h, 0.9)
    }

    #[test]
    fn test_small_faces_are_dropped() {
        // 1% of 1000x1000 is 10_000
        let dets = vec![face(0.0, 99.0, 100.0), face(200.0, 100.0, 100.0)];
        let out = filter_faces(&dets, 1000, 1000, 0.01);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].center_x, 250.0);
    }

    #[test]
    fn test_sorted_by_area_descending() {
        let dets = vec![
            face(0.0, 100.0, 100.0),
            face(300.0, 200.0, 200.0),
            face(600.0, 150.0, 150.0),
        ];
        let out = filter_faces(&dets, 1000, 1000, 0.01);

        let areas: Vec<f64> = out.iter().map(|c| c.area).collect();
        assert_eq!(areas, vec![40_000.0, 22_500.0, 10_000.0]);
    }

    #[test]
    fn test_equal_areas_keep_detection_order() {
        let dets = vec![
            face(700.0, 120.0, 120.0),
            face(100.0, 120.0, 120.0),
            face(400.0, 120.0, 120.0),
        ];
        let out = filter_faces(&dets, 1000, 1000, 0.01);

        let centers: Vec<f64> = out.iter().map(|c| c.center_x).collect();
        assert_eq!(centers, vec![760.0, 160.0, 460.0]);
    }

    #[test]
    fn test_low_confidence_is_not_filtered() {
        let dets = vec![RawDetection::new(0.0, 0.0, 200.0, 200.0, 0.1)];
        assert_eq!(filter_faces(&dets, 1000, 1000, 0.01).len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_faces(&[], 640, 480, 0.01).is_empty());
    }
}
