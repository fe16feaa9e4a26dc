use tracing::warn;

use lambda_model::{
    AttributeValue, FrameIndex, InferredAnnotation, LabeledShape, LabeledTag, ShapeType, Source,
    TaskLabelSchema,
};

use crate::pipeline::mask::encode_mask;

/// A detector result in persisted form.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Converted {
    Tag(LabeledTag),
    Shape(LabeledShape),
}

/// Convert a remapped detector result into a tag or a shape on `frame`.
///
/// Results whose label is not in the task, whose type is unknown, or whose
/// geometry is missing are dropped.
pub(crate) fn convert(
    anno: InferredAnnotation,
    frame: FrameIndex,
    schema: &TaskLabelSchema,
    conv_mask_to_poly: bool,
) -> Option<Converted> {
    let label = schema.get(&anno.label)?;
    let attributes: Vec<AttributeValue> = anno
        .attributes
        .iter()
        .filter_map(|attr| {
            Some(AttributeValue {
                spec_id: label.attribute_id(&attr.name)?,
                value: attr.value.clone(),
            })
        })
        .collect();

    if anno.is_tag() {
        return Some(Converted::Tag(LabeledTag {
            id: None,
            frame,
            label_id: label.id,
            group: None,
            attributes,
            source: Source::Auto,
        }));
    }

    let shape_type: ShapeType = match anno.kind.parse() {
        Ok(t) => t,
        Err(e) => {
            warn!(frame, label = %anno.label, error = %e, "dropping result of unknown type");
            return None;
        }
    };

    let (shape_type, points) = match shape_type {
        ShapeType::Mask if conv_mask_to_poly && anno.points.is_some() => {
            (ShapeType::Polygon, anno.points.unwrap_or_default())
        }
        ShapeType::Mask => {
            let Some(mask) = anno.mask.as_deref() else {
                warn!(frame, label = %anno.label, "dropping mask without data");
                return None;
            };
            let Some(rle) = encode_mask(mask) else {
                warn!(frame, label = %anno.label, len = mask.len(), "dropping mask without bounding box");
                return None;
            };
            (ShapeType::Mask, rle)
        }
        other => {
            let Some(points) = anno.points else {
                warn!(frame, label = %anno.label, kind = %other, "dropping shape without points");
                return None;
            };
            (other, points)
        }
    };

    let mut shape = LabeledShape::auto(frame, label.id, shape_type, points);
    shape.group = anno.group_id;
    shape.attributes = attributes;
    if shape_type.is_rotatable() {
        shape.rotation = Some(anno.rotation.unwrap_or(0.0));
    }
    Some(Converted::Shape(shape))
}
