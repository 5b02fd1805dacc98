//! Face detector service.
//!
//! Loads a YuNet ONNX model once and answers detection requests from
//! [`reframe_ml_client::DetectorClient`] over a Unix domain socket, one
//! request per connection.

pub mod config;
pub mod error;
pub mod model;
pub mod service;

pub use config::DetectorConfig;
pub use error::{ServiceError, ServiceResult};
pub use model::{decode_detections, preprocess, FaceModel, YuNetModel, INPUT_SIZE};
pub use service::DetectorService;
