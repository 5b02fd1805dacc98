#![deny(unreachable_patterns)]
//! Frame decoding and face-driven framing.
//!
//! This crate provides:
//! - FFprobe metadata probing and an FFmpeg rawvideo frame reader
//! - The framing engine: face filtering, topology classification and
//!   temporal smoothing of camera anchors
//! - The timeline aggregator that drives detection over a sampled video

pub mod decode;
pub mod error;
pub mod framing;
pub mod metrics;
pub mod probe;

pub use decode::{FfmpegFrameReader, FrameSource, SampledFrame, VecFrameSource};
pub use error::{MediaError, MediaResult};
pub use framing::{
    analyze_video, compress_timeline, FaceDetector, FramingConfig, FramingEngine,
    TemporalSmoother, TimelineAggregator, TrackerState,
};
pub use probe::{probe_video, VideoInfo};
