//! Shared data models for the reframe services.
//!
//! This crate provides Serde-serializable types for:
//! - Raw RGB frames handed to the face detector
//! - Face detections in original-frame pixel space
//! - Scene topology (center / split / group)
//! - Framing timeline records returned to API callers

pub mod detection;
pub mod frame;
pub mod scene;
pub mod timeline;

// Re-export common types
pub use detection::{Landmark, RawDetection, LANDMARK_COUNT};
pub use frame::{Frame, FrameError, BYTES_PER_PIXEL};
pub use scene::{SceneMode, SceneObservation};
pub use timeline::TimelineRecord;
