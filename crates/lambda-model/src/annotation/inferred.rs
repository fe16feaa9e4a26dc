use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Annotation kind string a function uses for frame-level tags.
pub const TAG_KIND: &str = "tag";

/// One annotation as returned by a detector, before remapping.
///
/// Fields this crate does not interpret (confidence scores and the like)
/// are kept in `extra` and survive re-serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InferredAnnotation {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<f64>>,
    #[serde(default)]
    pub attributes: Vec<InferredAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InferredAnnotation {
    pub fn new(kind: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            label: label.into(),
            points: None,
            mask: None,
            attributes: Vec::new(),
            group_id: None,
            rotation: None,
            extra: Map::new(),
        }
    }

    pub fn with_points(mut self, points: Vec<f64>) -> Self {
        self.points = Some(points);
        self
    }

    pub fn with_mask(mut self, mask: Vec<f64>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(InferredAttribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Whether the annotation is a frame-level tag rather than a shape.
    pub fn is_tag(&self) -> bool {
        self.kind.eq_ignore_ascii_case(TAG_KIND)
    }
}

/// Attribute value reported by a function, always carried as a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredAttribute {
    pub name: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: String,
}

// Functions sometimes report numbers or booleans unquoted.
fn scalar_as_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "attribute value must be a scalar, got {other}"
        ))),
    }
}
