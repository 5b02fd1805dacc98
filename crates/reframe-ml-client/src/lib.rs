//! Client for the face detector service.
//!
//! The detector runs as a separate process and is reached over a local Unix
//! socket. Each request carries one raw RGB frame; each response carries the
//! faces found in it, already rescaled to the frame's pixel space.
//!
//! Messages are MessagePack maps behind a 4-byte big-endian length prefix,
//! one request and one response per connection.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{DetectorClient, DetectorClientConfig};
pub use error::{DetectorError, DetectorResult};
pub use protocol::{InferenceRequest, InferenceResponse, WireDetection, MAX_MESSAGE_BYTES};
