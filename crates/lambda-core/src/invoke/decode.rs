use serde_json::Value;

use lambda_model::InferredAnnotation;

use crate::error::{CoreResult, TransportError};

/// Decode a detector response: a list of annotations.
pub fn decode_annotations(value: Value) -> CoreResult<Vec<InferredAnnotation>> {
    serde_json::from_value(value)
        .map_err(|e| TransportError::Decode(format!("detector output: {e}")).into())
}

/// Decode a matcher response: for each box of the first frame, the index of
/// its match in the second frame or a negative value for no match.
pub fn decode_matching(value: Value) -> CoreResult<Vec<i64>> {
    serde_json::from_value(value)
        .map_err(|e| TransportError::Decode(format!("matcher output: {e}")).into())
}
