use serde::{Deserialize, Serialize};

/// Hints for interactive functions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveConfig {
    pub min_pos_points: i64,
    /// `-1` means negative points are not used.
    pub min_neg_points: i64,
    /// The first two positive points describe a bounding box.
    pub startswith_box: bool,
    pub help_message: String,
    pub animated_gif: String,
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            min_pos_points: 1,
            min_neg_points: -1,
            startswith_box: false,
            help_message: String::new(),
            animated_gif: String::new(),
        }
    }
}
