//! HTTP handlers.

pub mod health;
pub mod process;

pub use health::{health, ready};
pub use process::process_video;
