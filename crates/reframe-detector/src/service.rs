//! Unix socket server for the face model.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

use reframe_ml_client::protocol::{read_message, write_message};
use reframe_ml_client::{InferenceRequest, InferenceResponse, WireDetection};
use reframe_models::{Frame, RawDetection};

use crate::config::DetectorConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::model::FaceModel;

/// Warm-up frame size (width, height).
const WARMUP_SIZE: (u32, u32) = (640, 480);

/// Long-lived detector service.
///
/// Lifecycle: [`initialize`](Self::initialize) binds the socket and warms the
/// model, [`serve`](Self::serve) answers requests until the shutdown future
/// resolves, then the socket file is removed.
pub struct DetectorService<M> {
    model: Arc<Mutex<M>>,
    listener: UnixListener,
    socket_path: PathBuf,
    read_timeout: Duration,
}

impl<M: FaceModel + 'static> DetectorService<M> {
    /// Bind the socket (replacing a stale one) and warm up the model.
    pub async fn initialize(config: &DetectorConfig, model: M) -> ServiceResult<Self> {
        let socket_path = config.socket_path.clone();
        remove_stale_socket(&socket_path)?;

        let listener = UnixListener::bind(&socket_path).map_err(|source| ServiceError::Bind {
            path: socket_path.display().to_string(),
            source,
        })?;
        info!("[DETECTOR] Listening on {}", socket_path.display());

        let service = Self {
            model: Arc::new(Mutex::new(model)),
            listener,
            socket_path,
            read_timeout: config.read_timeout,
        };

        if config.warmup {
            let started = Instant::now();
            let (w, h) = WARMUP_SIZE;
            service.run_model(Frame::black(w, h)?).await?;
            info!(
                "[DETECTOR] Warm-up complete in {:.1}ms",
                started.elapsed().as_secs_f64() * 1000.0
            );
        }

        Ok(service)
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Each connection is handled on its own task; inference itself is
    /// serialized on the blocking pool.
    pub async fn serve<F>(self, shutdown: F) -> ServiceResult<()>
    where
        F: Future<Output = ()>,
    {
        info!("[DETECTOR] Service ready");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("[DETECTOR] Shutting down");
                    break;
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, _)) => {
                            let model = Arc::clone(&self.model);
                            let read_timeout = self.read_timeout;
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, model, read_timeout).await {
                                    if e.is_empty_connection() {
                                        debug!("[DETECTOR] Connection closed without a request");
                                    } else if matches!(e, ServiceError::ReadTimeout(_)) {
                                        warn!("[DETECTOR] Dropping idle connection: {}", e);
                                    } else {
                                        error!("[DETECTOR] Error processing request: {}", e);
                                    }
                                }
                            });
                        }
                        Err(e) => warn!("[DETECTOR] Accept failed: {}", e),
                    }
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Close the listener and remove the socket file.
    pub fn shutdown(self) {
        let path = self.socket_path.clone();
        drop(self.listener);
        match std::fs::remove_file(&path) {
            Ok(()) => info!("[DETECTOR] Removed socket {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("[DETECTOR] Failed to remove socket {}: {}", path.display(), e),
        }
    }

    async fn run_model(&self, frame: Frame) -> ServiceResult<Vec<RawDetection>> {
        infer_blocking(Arc::clone(&self.model), frame).await
    }
}

fn remove_stale_socket(path: &Path) -> ServiceResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("[DETECTOR] Removed stale socket {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn infer_blocking<M: FaceModel + 'static>(
    model: Arc<Mutex<M>>,
    frame: Frame,
) -> ServiceResult<Vec<RawDetection>> {
    tokio::task::spawn_blocking(move || {
        let mut model = model
            .lock()
            .map_err(|_| ServiceError::internal("model lock poisoned"))?;
        model.infer(&frame)
    })
    .await
    .map_err(|e| ServiceError::internal(format!("inference task failed: {e}")))?
}

async fn handle_connection<M: FaceModel + 'static>(
    mut stream: UnixStream,
    model: Arc<Mutex<M>>,
    read_timeout: Duration,
) -> ServiceResult<()> {
    let request: InferenceRequest = tokio::time::timeout(read_timeout, read_message(&mut stream))
        .await
        .map_err(|_| ServiceError::ReadTimeout(read_timeout))??;
    let frame = request.into_frame()?;
    let (width, height) = (frame.width(), frame.height());

    let started = Instant::now();
    let detections = infer_blocking(model, frame).await?;
    let inference_ms = started.elapsed().as_secs_f64() * 1000.0;

    let response = InferenceResponse {
        detections: detections.iter().map(WireDetection::from_detection).collect(),
        inference_ms,
    };
    write_message(&mut stream, &response).await?;

    debug!(
        "[DETECTOR] Processed frame {}x{}, found {} faces in {:.1}ms",
        width,
        height,
        response.detections.len(),
        inference_ms
    );
    Ok(())
}
