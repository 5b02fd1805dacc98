//! Framing engine metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_PROCESSED_TOTAL: &str = "reframe_frames_processed_total";
    pub const DETECTOR_FAILURES_TOTAL: &str = "reframe_detector_failures_total";
    pub const DETECTOR_LATENCY_SECONDS: &str = "reframe_detector_latency_seconds";
}

/// Record one sampled frame pushed through the engine.
pub fn record_frame_processed(mode: &str) {
    let labels = [("mode", mode.to_string())];
    counter!(names::FRAMES_PROCESSED_TOTAL, &labels).increment(1);
}

/// Record a detector transport failure that was degraded to "no faces".
pub fn record_detector_failure(retryable: bool) {
    let labels = [("retryable", retryable.to_string())];
    counter!(names::DETECTOR_FAILURES_TOTAL, &labels).increment(1);
}

/// Record detector round-trip time.
pub fn record_detector_latency(duration_secs: f64) {
    histogram!(names::DETECTOR_LATENCY_SECONDS).record(duration_secs);
}
