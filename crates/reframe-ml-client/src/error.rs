//! Detector client error types.

use std::time::Duration;

use thiserror::Error;

pub type DetectorResult<T> = Result<T, DetectorError>;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Detector service unavailable at {path}: {source}")]
    ServiceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Detector request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Message of {size} bytes exceeds limit of {limit} bytes")]
    MessageTooLarge { size: usize, limit: usize },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DetectorError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Transient transport faults that may succeed on the next frame.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DetectorError::ServiceUnavailable { .. } | DetectorError::Timeout(_) | DetectorError::Io(_)
        )
    }
}
