//! Face-driven framing.
//!
//! Each sampled frame flows through four stages:
//!
//! ```text
//! Detector ──► Face Filter ──► Topology Classifier ──► Temporal Smoother ──► TimelineRecord
//!                (area)         (center/split/group)     (dead zone + EMA)
//! ```
//!
//! The only state that crosses frames is [`TrackerState`], which is threaded
//! through the smoother explicitly and owned by one [`FramingEngine`].

pub mod config;
pub mod engine;
pub mod filter;
pub mod smoother;
pub mod timeline;
pub mod topology;

pub use config::FramingConfig;
pub use engine::FramingEngine;
pub use filter::{filter_faces, FaceCandidate};
pub use smoother::{TemporalSmoother, TrackerState};
pub use timeline::{analyze_video, compress_timeline, FaceDetector, TimelineAggregator};
pub use topology::classify;
