//! Timeline aggregation over a sampled video.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use reframe_ml_client::{DetectorClient, DetectorError};
use reframe_models::{Frame, RawDetection, TimelineRecord};

use super::config::FramingConfig;
use super::engine::FramingEngine;
use crate::decode::{FfmpegFrameReader, FrameSource};
use crate::error::MediaResult;
use crate::metrics;

/// Anything that can find faces in a frame.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect(&self, frame: &Frame) -> Result<Vec<RawDetection>, DetectorError>;
}

#[async_trait]
impl FaceDetector for DetectorClient {
    async fn detect(&self, frame: &Frame) -> Result<Vec<RawDetection>, DetectorError> {
        DetectorClient::detect(self, frame).await
    }
}

/// Drives detection and framing over a frame source.
pub struct TimelineAggregator {
    engine: FramingEngine,
    sample_interval: u64,
}

impl TimelineAggregator {
    pub fn new(config: FramingConfig) -> Self {
        Self {
            sample_interval: config.sample_interval.max(1),
            engine: FramingEngine::new(config),
        }
    }

    /// Run the whole source, returning one record per sampled frame.
    ///
    /// Detector failures never abort the run; the frame is treated as having
    /// no faces. Frames whose index is not a multiple of the sample interval
    /// are skipped.
    pub async fn run<S, D>(&mut self, source: &mut S, detector: &D) -> MediaResult<Vec<TimelineRecord>>
    where
        S: FrameSource + ?Sized,
        D: FaceDetector + ?Sized,
    {
        let mut records = Vec::new();
        let mut failures = 0u64;

        while let Some(sampled) = source.next_frame().await? {
            if sampled.index % self.sample_interval != 0 {
                continue;
            }

            let frame = sampled.frame;
            let started = Instant::now();
            let detections = match detector.detect(&frame).await {
                Ok(detections) => {
                    metrics::record_detector_latency(started.elapsed().as_secs_f64());
                    detections
                }
                Err(e) => {
                    failures += 1;
                    warn!(
                        "[TIMELINE] Detection failed for frame {}, treating as empty: {}",
                        sampled.index, e
                    );
                    metrics::record_detector_failure(e.is_retryable());
                    Vec::new()
                }
            };

            let record = self
                .engine
                .process(sampled.index, frame.width(), frame.height(), &detections);
            metrics::record_frame_processed(record.mode.as_str());
            records.push(record);
        }

        if failures > 0 {
            warn!(
                "[TIMELINE] {} of {} sampled frames had no detector result",
                failures,
                records.len()
            );
        }
        debug!(
            "[TIMELINE] Built {} records, final mode {}",
            records.len(),
            self.engine.state().mode
        );
        Ok(records)
    }
}

/// Decode `path` and build its framing timeline.
pub async fn analyze_video<D>(
    path: impl AsRef<Path>,
    detector: &D,
    config: FramingConfig,
) -> MediaResult<Vec<TimelineRecord>>
where
    D: FaceDetector + ?Sized,
{
    let path = path.as_ref();
    let started = Instant::now();

    let mut reader = FfmpegFrameReader::open(path, config.sample_interval).await?;
    let records = TimelineAggregator::new(config)
        .run(&mut reader, detector)
        .await?;
    reader.close().await;

    info!(
        "[TIMELINE] Analyzed {} in {:.2}s ({} records)",
        path.display(),
        started.elapsed().as_secs_f64(),
        records.len()
    );
    Ok(records)
}

/// Keep the first record and every record whose mode differs from the one
/// before it.
pub fn compress_timeline(records: &[TimelineRecord]) -> Vec<TimelineRecord> {
    let mut out: Vec<TimelineRecord> = Vec::new();
    for record in records {
        if out.last().map_or(true, |last| last.mode != record.mode) {
            out.push(record.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::VecFrameSource;
    use reframe_models::SceneMode;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns scripted results in order, then no faces.
    struct ScriptedDetector {
        script: Mutex<VecDeque<Result<Vec<RawDetection>, DetectorError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedDetector {
        fn new(script: Vec<Result<Vec<RawDetection>, DetectorError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FaceDetector for ScriptedDetector {
        async fn detect(&self, _frame: &Frame) -> Result<Vec<RawDetection>, DetectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
        }
    }

    fn face_at(center_x: f64) -> RawDetection {
        RawDetection::new(center_x - 20.0, 10.0, 40.0, 40.0, 0.9)
    }

    fn frames(n: usize) -> VecFrameSource {
        VecFrameSource::new((0..n).map(|_| Frame::black(200, 100).unwrap()).collect())
    }

    #[tokio::test]
    async fn test_every_fifth_frame_is_sampled() {
        let detector = ScriptedDetector::new(vec![]);
        let mut source = frames(12);

        let records = TimelineAggregator::new(FramingConfig::default())
            .run(&mut source, &detector)
            .await
            .unwrap();

        let indices: Vec<u64> = records.iter().map(|r| r.frame_index).collect();
        assert_eq!(indices, vec![0, 5, 10]);
        assert_eq!(detector.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_detector_failure_is_treated_as_empty() {
        let detector = ScriptedDetector::new(vec![
            Ok(vec![face_at(60.0)]),
            Err(DetectorError::Timeout(Duration::from_millis(100))),
            Err(DetectorError::invalid_response("garbage")),
        ]);
        let mut source = frames(15);

        let records = TimelineAggregator::new(FramingConfig::default())
            .run(&mut source, &detector)
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].anchors, vec![60]);
        assert_eq!(records[1].anchors, vec![60]);
        assert_eq!(records[2].anchors, vec![60]);
    }

    #[tokio::test]
    async fn test_detector_down_for_whole_video_centers() {
        let detector = ScriptedDetector::new(
            (0..2)
                .map(|_| Err(DetectorError::Timeout(Duration::from_millis(100))))
                .collect(),
        );
        let mut source = frames(10);

        let records = TimelineAggregator::new(FramingConfig::default())
            .run(&mut source, &detector)
            .await
            .unwrap();

        for record in records {
            assert_eq!(record.mode, SceneMode::Center);
            assert_eq!(record.anchors, vec![100]);
        }
    }

    #[tokio::test]
    async fn test_empty_source_gives_empty_timeline() {
        let detector = ScriptedDetector::new(vec![]);
        let mut source = frames(0);

        let records = TimelineAggregator::new(FramingConfig::default())
            .run(&mut source, &detector)
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_video_keeps_source_frame_numbers() {
        if which::which("ffmpeg").is_err() || which::which("ffprobe").is_err() {
            eprintln!("ffmpeg/ffprobe not installed, skipping");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("testsrc.mp4");
        let status = tokio::process::Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "lavfi", "-i", "testsrc=size=64x48:rate=25"])
            .args(["-frames:v", "12", "-c:v", "mpeg4", "-pix_fmt", "yuv420p"])
            .arg(&video)
            .status()
            .await
            .unwrap();
        assert!(status.success());

        let detector = ScriptedDetector::new(vec![]);
        let records = analyze_video(&video, &detector, FramingConfig::default())
            .await
            .unwrap();

        let indices: Vec<u64> = records.iter().map(|r| r.frame_index).collect();
        assert_eq!(indices, vec![0, 5, 10]);
        assert_eq!(detector.calls.load(Ordering::SeqCst), 3);
        assert!(records.iter().all(|r| r.anchors == vec![32]));
    }

    #[test]
    fn test_compress_keeps_mode_changes() {
        let rec = |i, mode, a: Vec<i64>| TimelineRecord::new(i, mode, a);
        let timeline = vec![
            rec(0, SceneMode::Center, vec![100]),
            rec(5, SceneMode::Center, vec![110]),
            rec(10, SceneMode::Split, vec![10, 190]),
            rec(15, SceneMode::Split, vec![10, 190]),
            rec(20, SceneMode::Center, vec![100]),
        ];

        let compact = compress_timeline(&timeline);
        let indices: Vec<u64> = compact.iter().map(|r| r.frame_index).collect();
        assert_eq!(indices, vec![0, 10, 20]);
    }

    #[test]
    fn test_compress_empty() {
        assert!(compress_timeline(&[]).is_empty());
    }
}
