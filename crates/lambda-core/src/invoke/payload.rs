use serde::Serialize;
use serde_json::Value;

/// Request body sent to an inference function, one variant per kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Detector {
        image: String,
        data_path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        threshold: Option<f64>,
    },
    Interactor {
        image: String,
        pos_points: Vec<Value>,
        neg_points: Vec<Value>,
        obj_bbox: Option<Vec<Value>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        threshold: Option<f64>,
    },
    Reid {
        image0: String,
        image1: String,
        boxes0: Vec<Value>,
        boxes1: Vec<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_distance: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        threshold: Option<f64>,
    },
    Tracker {
        image: String,
        shapes: Vec<Value>,
        states: Vec<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        threshold: Option<f64>,
    },
}

impl Payload {
    /// Returns the function kind this payload is meant for.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Detector { .. } => "detector",
            Payload::Interactor { .. } => "interactor",
            Payload::Reid { .. } => "reid",
            Payload::Tracker { .. } => "tracker",
        }
    }
}
