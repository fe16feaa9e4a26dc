use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of an inference function as self-reported in its metadata.
///
/// Parsing is lossy: anything unrecognised becomes [`FunctionKind::Unknown`]
/// so that a single misconfigured function never hides the others.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    /// Runs on one frame and returns shapes or tags.
    Detector,
    /// Takes user clicks and returns a shape.
    Interactor,
    /// Matches boxes between two frames.
    Reid,
    /// Propagates shapes to the next frame.
    Tracker,
    #[default]
    #[serde(other)]
    Unknown,
}

impl FunctionKind {
    /// Parse a kind, mapping unrecognised values to `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "detector" => FunctionKind::Detector,
            "interactor" => FunctionKind::Interactor,
            "reid" => FunctionKind::Reid,
            "tracker" => FunctionKind::Tracker,
            _ => FunctionKind::Unknown,
        }
    }

    /// Returns the kind as a static string.
    pub fn kind(&self) -> &'static str {
        match self {
            FunctionKind::Detector => "detector",
            FunctionKind::Interactor => "interactor",
            FunctionKind::Reid => "reid",
            FunctionKind::Tracker => "tracker",
            FunctionKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}
