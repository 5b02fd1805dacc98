//! Detector service client over a Unix domain socket.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tracing::{debug, warn};

use reframe_models::{Frame, RawDetection};

use crate::error::{DetectorError, DetectorResult};
use crate::protocol::{read_message, write_message, InferenceRequest, InferenceResponse};

/// Default socket path shared with the detector service.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/yunet.sock";

/// Configuration for the detector client.
#[derive(Debug, Clone)]
pub struct DetectorClientConfig {
    /// Unix socket the detector listens on
    pub socket_path: PathBuf,
    /// Bound on connect + request + response
    pub timeout: Duration,
}

impl Default for DetectorClientConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            timeout: Duration::from_millis(100),
        }
    }
}

impl DetectorClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            socket_path: std::env::var("DETECTOR_SOCKET_PATH")
                .or_else(|_| std::env::var("SOCKET_PATH"))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOCKET_PATH)),
            timeout: Duration::from_millis(
                std::env::var("DETECTOR_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(100),
            ),
        }
    }
}

/// Client for the face detector service.
///
/// Holds no connection: every call opens a fresh socket, so one client can be
/// shared by any number of concurrent video analyses.
#[derive(Debug, Clone)]
pub struct DetectorClient {
    config: DetectorClientConfig,
}

impl DetectorClient {
    /// Create a new detector client.
    pub fn new(config: DetectorClientConfig) -> Self {
        Self { config }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(DetectorClientConfig::from_env())
    }

    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Check whether the detector socket accepts connections.
    pub async fn health_check(&self) -> bool {
        match tokio::time::timeout(self.config.timeout, UnixStream::connect(&self.config.socket_path)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!("[DETECTOR] Health check failed: {}", e);
                false
            }
            Err(_) => {
                warn!("[DETECTOR] Health check timed out after {:?}", self.config.timeout);
                false
            }
        }
    }

    /// Submit one frame and return the faces found in it.
    pub async fn detect(&self, frame: &Frame) -> DetectorResult<Vec<RawDetection>> {
        let response = tokio::time::timeout(self.config.timeout, self.exchange(frame))
            .await
            .map_err(|_| DetectorError::Timeout(self.config.timeout))??;

        debug!(
            "[DETECTOR] {}x{} frame: {} faces in {:.1}ms",
            frame.width(),
            frame.height(),
            response.detections.len(),
            response.inference_ms
        );

        response
            .detections
            .into_iter()
            .map(|d| d.into_detection())
            .collect()
    }

    /// Like [`detect`](Self::detect), but transport failures yield no faces.
    pub async fn detect_or_empty(&self, frame: &Frame) -> Vec<RawDetection> {
        match self.detect(frame).await {
            Ok(detections) => detections,
            Err(e) => {
                warn!("[DETECTOR] Detection failed, treating frame as empty: {}", e);
                Vec::new()
            }
        }
    }

    async fn exchange(&self, frame: &Frame) -> DetectorResult<InferenceResponse> {
        let mut stream = UnixStream::connect(&self.config.socket_path)
            .await
            .map_err(|source| DetectorError::ServiceUnavailable {
                path: self.config.socket_path.display().to_string(),
                source,
            })?;

        write_message(&mut stream, &InferenceRequest::from_frame(frame)).await?;
        stream.shutdown().await?;

        read_message(&mut stream).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::WireDetection;
    use tokio::net::UnixListener;

    fn frame() -> Frame {
        Frame::black(8, 4).unwrap()
    }

    fn client_for(path: &Path, timeout: Duration) -> DetectorClient {
        DetectorClient::new(DetectorClientConfig {
            socket_path: path.to_path_buf(),
            timeout,
        })
    }

    /// Serve exactly one connection, replying with `response`.
    fn serve_once(listener: UnixListener, response: InferenceResponse) -> tokio::task::JoinHandle<InferenceRequest> {
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request: InferenceRequest = read_message(&mut stream).await.unwrap();
            write_message(&mut stream, &response).await.unwrap();
            request
        })
    }

    #[test]
    fn test_config_defaults() {
        let config = DetectorClientConfig::default();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/yunet.sock"));
        assert_eq!(config.timeout, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_detect_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detector.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = serve_once(
            listener,
            InferenceResponse {
                detections: vec![WireDetection {
                    x: 1.0,
                    y: 2.0,
                    w: 3.0,
                    h: 4.0,
                    c: 0.9,
                    l: vec![0.0; 10],
                }],
                inference_ms: 4.2,
            },
        );

        let detections = client_for(&path, Duration::from_secs(2))
            .detect(&frame())
            .await
            .unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].width, 3.0);
        assert_eq!(detections[0].confidence, 0.9);

        let request = server.await.unwrap();
        assert_eq!((request.width, request.height), (8, 4));
        assert_eq!(request.data.len(), 8 * 4 * 3);
    }

    #[tokio::test]
    async fn test_missing_socket_is_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let client = client_for(&dir.path().join("absent.sock"), Duration::from_secs(1));

        let err = client.detect(&frame()).await.unwrap_err();
        assert!(matches!(err, DetectorError::ServiceUnavailable { .. }));
        assert!(err.is_retryable());
        assert!(client.detect_or_empty(&frame()).await.is_empty());
        assert!(!client.health_check().await);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slow.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let _server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let err = client_for(&path, Duration::from_millis(50))
            .detect(&frame())
            .await
            .unwrap_err();
        assert!(matches!(err, DetectorError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_malformed_response_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let _server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _: InferenceRequest = read_message(&mut stream).await.unwrap();
            stream.write_u32(3).await.unwrap();
            stream.write_all(&[0xc1, 0xc1, 0xc1]).await.unwrap();
        });

        let err = client_for(&path, Duration::from_secs(2))
            .detect(&frame())
            .await
            .unwrap_err();
        assert!(matches!(err, DetectorError::Decode(_)));
        assert!(!err.is_retryable());
    }
}
