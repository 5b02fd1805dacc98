//! Detector service errors.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use reframe_ml_client::DetectorError;
use reframe_models::FrameError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Failed to bind {path}: {source}")]
    Bind {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No request received within {0:?}")]
    ReadTimeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(#[from] DetectorError),

    #[error("Invalid frame: {0}")]
    InvalidFrame(#[from] FrameError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True when the peer closed the connection without sending a request.
    ///
    /// Health checks connect and hang up, so this is not worth a warning.
    pub fn is_empty_connection(&self) -> bool {
        match self {
            ServiceError::Protocol(DetectorError::Io(e)) => {
                e.kind() == std::io::ErrorKind::UnexpectedEof
            }
            _ => false,
        }
    }
}
