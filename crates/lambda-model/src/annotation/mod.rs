mod inferred;
pub use inferred::{InferredAnnotation, InferredAttribute, TAG_KIND};

mod persisted;
pub use persisted::{
    AttributeValue, LabeledData, LabeledShape, LabeledTag, LabeledTrack, ShapeType, Source,
    TrackedShape,
};
