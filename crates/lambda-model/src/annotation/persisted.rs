use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{AttributeId, FrameIndex, LabelId},
    error::{ModelError, ModelResult},
};

/// Geometry kind of a persisted shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rectangle,
    Polygon,
    Polyline,
    Points,
    Ellipse,
    Cuboid,
    Mask,
    Skeleton,
}

impl ShapeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Polygon => "polygon",
            ShapeType::Polyline => "polyline",
            ShapeType::Points => "points",
            ShapeType::Ellipse => "ellipse",
            ShapeType::Cuboid => "cuboid",
            ShapeType::Mask => "mask",
            ShapeType::Skeleton => "skeleton",
        }
    }

    /// Only boxes and ellipses carry a rotation angle.
    pub fn is_rotatable(&self) -> bool {
        matches!(self, ShapeType::Rectangle | ShapeType::Ellipse)
    }
}

impl FromStr for ShapeType {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rectangle" => Ok(ShapeType::Rectangle),
            "polygon" => Ok(ShapeType::Polygon),
            "polyline" => Ok(ShapeType::Polyline),
            "points" => Ok(ShapeType::Points),
            "ellipse" => Ok(ShapeType::Ellipse),
            "cuboid" => Ok(ShapeType::Cuboid),
            "mask" => Ok(ShapeType::Mask),
            "skeleton" => Ok(ShapeType::Skeleton),
            other => Err(ModelError::UnknownShapeType(other.to_string())),
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced an annotation.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Manual,
    Auto,
}

/// Attribute value bound to a task attribute spec.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub spec_id: AttributeId,
    pub value: String,
}

/// A frame-level tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledTag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub frame: FrameIndex,
    pub label_id: LabelId,
    #[serde(default)]
    pub group: Option<u64>,
    #[serde(default)]
    pub attributes: Vec<AttributeValue>,
    #[serde(default)]
    pub source: Source,
}

/// A standalone shape on one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub frame: FrameIndex,
    pub label_id: LabelId,
    #[serde(rename = "type")]
    pub shape_type: ShapeType,
    #[serde(default)]
    pub occluded: bool,
    pub points: Vec<f64>,
    #[serde(default)]
    pub z_order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default)]
    pub group: Option<u64>,
    #[serde(default)]
    pub attributes: Vec<AttributeValue>,
    #[serde(default)]
    pub source: Source,
}

impl LabeledShape {
    /// Auto-sourced shape with neutral defaults.
    pub fn auto(frame: FrameIndex, label_id: LabelId, shape_type: ShapeType, points: Vec<f64>) -> Self {
        Self {
            id: None,
            frame,
            label_id,
            shape_type,
            occluded: false,
            points,
            z_order: 0,
            rotation: None,
            group: None,
            attributes: Vec::new(),
            source: Source::Auto,
        }
    }
}

/// One keyframe of a track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedShape {
    pub frame: FrameIndex,
    #[serde(rename = "type")]
    pub shape_type: ShapeType,
    #[serde(default)]
    pub occluded: bool,
    #[serde(default)]
    pub outside: bool,
    pub points: Vec<f64>,
    #[serde(default)]
    pub z_order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default)]
    pub attributes: Vec<AttributeValue>,
}

impl From<LabeledShape> for TrackedShape {
    /// Drops the per-shape identity fields and resets `outside` and attributes.
    fn from(shape: LabeledShape) -> Self {
        Self {
            frame: shape.frame,
            shape_type: shape.shape_type,
            occluded: shape.occluded,
            outside: false,
            points: shape.points,
            z_order: shape.z_order,
            rotation: shape.rotation,
            attributes: Vec::new(),
        }
    }
}

/// An object followed across frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledTrack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub frame: FrameIndex,
    pub label_id: LabelId,
    #[serde(default)]
    pub group: Option<u64>,
    #[serde(default)]
    pub attributes: Vec<AttributeValue>,
    #[serde(default)]
    pub source: Source,
    pub shapes: Vec<TrackedShape>,
}

/// Tags, shapes and tracks of a scope, submitted together.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledData {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub tags: Vec<LabeledTag>,
    #[serde(default)]
    pub shapes: Vec<LabeledShape>,
    #[serde(default)]
    pub tracks: Vec<LabeledTrack>,
}

impl LabeledData {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.shapes.is_empty() && self.tracks.is_empty()
    }

    /// Number of top-level objects.
    pub fn len(&self) -> usize {
        self.tags.len() + self.shapes.len() + self.tracks.len()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
        self.shapes.clear();
        self.tracks.clear();
    }
}
