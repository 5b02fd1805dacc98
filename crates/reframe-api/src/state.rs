//! Application state.

use std::sync::Arc;

use reframe_media::FramingConfig;
use reframe_ml_client::DetectorClient;

use crate::config::ApiConfig;

/// Shared application state.
///
/// Each request builds its own framing engine; only the detector client is shared.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub detector: Arc<DetectorClient>,
    pub framing: FramingConfig,
}

impl AppState {
    pub fn new(config: ApiConfig, detector: DetectorClient) -> Self {
        Self {
            config: Arc::new(config),
            detector: Arc::new(detector),
            framing: FramingConfig::default(),
        }
    }
}
