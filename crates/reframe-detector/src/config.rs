//! Detector service configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Detector service configuration.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// ONNX model file
    pub model_path: PathBuf,
    /// Unix socket to listen on
    pub socket_path: PathBuf,
    /// Detections below this confidence are not returned
    pub confidence_threshold: f64,
    /// Run one inference on a black frame before accepting connections
    pub warmup: bool,
    /// How long a connection may take to deliver its request
    pub read_timeout: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("/app/models/yunet_320x320.onnx"),
            socket_path: PathBuf::from("/tmp/yunet.sock"),
            confidence_threshold: 0.6,
            warmup: true,
            read_timeout: Duration::from_secs(5),
        }
    }
}

impl DetectorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model_path: std::env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            socket_path: std::env::var("SOCKET_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.socket_path),
            confidence_threshold: std::env::var("DETECTOR_CONFIDENCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|c: &f64| (0.0..=1.0).contains(c))
                .unwrap_or(defaults.confidence_threshold),
            warmup: std::env::var("DETECTOR_WARMUP")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(defaults.warmup),
            read_timeout: std::env::var("DETECTOR_READ_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.read_timeout),
        }
    }
}
