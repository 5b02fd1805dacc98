//! Scene topology for a single frame.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified scene layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SceneMode {
    /// Zero or one subject: a single anchor.
    #[default]
    Center,

    /// Two subjects far apart: two independent anchors, left to right.
    Split,

    /// Two subjects close together: one averaged anchor.
    Group,
}

impl SceneMode {
    /// Returns the mode name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneMode::Center => "center",
            SceneMode::Split => "split",
            SceneMode::Group => "group",
        }
    }

    /// Number of anchors a stabilized record in this mode carries.
    pub fn anchor_count(&self) -> usize {
        match self {
            SceneMode::Center | SceneMode::Group => 1,
            SceneMode::Split => 2,
        }
    }
}

impl fmt::Display for SceneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw (unsmoothed) classification result for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObservation {
    pub mode: SceneMode,
    /// Anchor x-coordinates; empty only for a `center` frame with no subjects.
    pub anchors: Vec<f64>,
}

impl SceneObservation {
    /// No usable subject in the frame.
    pub fn empty() -> Self {
        Self {
            mode: SceneMode::Center,
            anchors: Vec::new(),
        }
    }

    /// A single subject.
    pub fn center(anchor: f64) -> Self {
        Self {
            mode: SceneMode::Center,
            anchors: vec![anchor],
        }
    }

    /// Two subjects, stored left to right.
    pub fn split(a: f64, b: f64) -> Self {
        Self {
            mode: SceneMode::Split,
            anchors: vec![a.min(b), a.max(b)],
        }
    }

    /// Two subjects framed together.
    pub fn group(anchor: f64) -> Self {
        Self {
            mode: SceneMode::Group,
            anchors: vec![anchor],
        }
    }

    /// True when the classifier found no subject.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
