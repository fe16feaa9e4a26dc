use serde::Deserialize;
use serde_json::Value;

use crate::{
    descriptor::{FunctionDescriptor, InteractiveConfig},
    domain::AttributeSpec,
    error::{ModelError, ModelResult},
    kind::FunctionKind,
};

#[derive(Deserialize)]
struct RawLabel {
    name: String,
    #[serde(default)]
    attributes: Vec<AttributeSpec>,
}

pub(super) fn parse(value: &Value) -> ModelResult<FunctionDescriptor> {
    let metadata = value
        .get("metadata")
        .ok_or_else(|| ModelError::InvalidDescriptor("missing `metadata`".into()))?;
    let id = metadata
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ModelError::InvalidDescriptor("missing `metadata.name`".into()))?;

    let empty = Value::Null;
    let anno = metadata.get("annotations").unwrap_or(&empty);

    let kind = anno
        .get("type")
        .and_then(Value::as_str)
        .map(FunctionKind::parse)
        .unwrap_or_default();

    let raw_labels: Vec<RawLabel> = match anno.get("spec").and_then(Value::as_str) {
        Some(spec) if !spec.trim().is_empty() => serde_json::from_str(spec).map_err(|e| {
            ModelError::InvalidDescriptor(format!("`{id}` has malformed label spec: {e}"))
        })?,
        _ => Vec::new(),
    };

    let mut desc = FunctionDescriptor::new(id, kind);
    for label in raw_labels {
        desc = desc.with_label(label.name, label.attributes);
    }

    desc.interactive = InteractiveConfig {
        min_pos_points: int_field(anno, "min_pos_points")?.unwrap_or(1),
        min_neg_points: int_field(anno, "min_neg_points")?.unwrap_or(-1),
        startswith_box: bool_field(anno, "startswith_box"),
        help_message: str_field(anno, "help_message").unwrap_or_default(),
        animated_gif: str_field(anno, "animated_gif").unwrap_or_default(),
    };
    desc.version = match int_field(anno, "version")? {
        Some(v) => u32::try_from(v)
            .map_err(|_| ModelError::InvalidDescriptor(format!("`{id}` has invalid version {v}")))?,
        None => 1,
    };
    desc.framework = str_field(anno, "framework");
    if let Some(name) = str_field(anno, "name") {
        desc.name = name;
    }
    desc.description = value
        .pointer("/spec/description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let status = value.get("status").unwrap_or(&empty);
    desc.state = str_field(status, "state").unwrap_or_default();
    desc.port = status
        .get("httpPort")
        .and_then(Value::as_u64)
        .and_then(|p| u16::try_from(p).ok());

    desc.validate()?;
    Ok(desc)
}

fn str_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

// Registry annotations are string-valued, but numbers are tolerated too.
fn int_field(obj: &Value, key: &str) -> ModelResult<Option<i64>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ModelError::InvalidDescriptor(format!("`{key}` is not an integer"))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ModelError::InvalidDescriptor(format!("`{key}` is not an integer: {s}"))),
        Some(other) => Err(ModelError::InvalidDescriptor(format!(
            "`{key}` is not an integer: {other}"
        ))),
    }
}

fn bool_field(obj: &Value, key: &str) -> bool {
    match obj.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::InputType;

    fn document(annotations: Value) -> Value {
        json!({
            "metadata": { "name": "openvino-yolo", "annotations": annotations },
            "spec": { "description": "YOLO v3 via OpenVINO" },
            "status": { "state": "ready", "httpPort": 32768 }
        })
    }

    #[test]
    fn parses_detector_with_defaults() {
        let spec = r#"[{"name":"car","attributes":[{"name":"color","input_type":"select","values":["red","blue"]}]},{"name":"person"}]"#;
        let desc = parse(&document(json!({
            "type": "detector",
            "spec": spec,
            "framework": "openvino"
        })))
        .unwrap();

        assert_eq!(desc.id, "openvino-yolo");
        assert_eq!(desc.name, "openvino-yolo");
        assert_eq!(desc.kind, FunctionKind::Detector);
        assert_eq!(desc.labels, vec!["car", "person"]);
        assert_eq!(
            desc.attribute("car", "color").map(|a| a.input_type),
            Some(InputType::Select)
        );
        assert!(desc.attributes_of("person").is_empty());
        assert_eq!(desc.interactive, InteractiveConfig::default());
        assert_eq!(desc.version, 1);
        assert_eq!(desc.state, "ready");
        assert_eq!(desc.description, "YOLO v3 via OpenVINO");
        assert_eq!(desc.framework.as_deref(), Some("openvino"));
        assert_eq!(desc.port, Some(32768));
    }

    #[test]
    fn parses_interactor_hints_from_strings() {
        let desc = parse(&document(json!({
            "type": "interactor",
            "name": "SAM",
            "min_pos_points": "2",
            "min_neg_points": "0",
            "startswith_box": "true",
            "version": "2",
            "help_message": "click the object"
        })))
        .unwrap();

        assert_eq!(desc.kind, FunctionKind::Interactor);
        assert_eq!(desc.name, "SAM");
        assert_eq!(desc.interactive.min_pos_points, 2);
        assert_eq!(desc.interactive.min_neg_points, 0);
        assert!(desc.interactive.startswith_box);
        assert_eq!(desc.interactive.help_message, "click the object");
        assert_eq!(desc.version, 2);
        assert!(desc.labels.is_empty());
    }

    #[test]
    fn unknown_type_becomes_unknown_kind() {
        let desc = parse(&document(json!({ "type": "segmenter" }))).unwrap();
        assert_eq!(desc.kind, FunctionKind::Unknown);

        let desc = parse(&document(json!({}))).unwrap();
        assert_eq!(desc.kind, FunctionKind::Unknown);
    }

    #[test]
    fn rejects_duplicate_labels() {
        let err = parse(&document(json!({
            "type": "detector",
            "spec": r#"[{"name":"car"},{"name":"car"}]"#
        })))
        .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateLabel { .. }));
    }

    #[test]
    fn rejects_duplicate_attributes() {
        let err = parse(&document(json!({
            "type": "detector",
            "spec": r#"[{"name":"car","attributes":[{"name":"a","input_type":"text"},{"name":"a","input_type":"text"}]}]"#
        })))
        .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateAttribute { .. }));
    }

    #[test]
    fn rejects_missing_name_and_bad_spec() {
        assert!(matches!(
            parse(&json!({ "metadata": {} })),
            Err(ModelError::InvalidDescriptor(_))
        ));
        assert!(matches!(
            parse(&document(json!({ "spec": "not json" }))),
            Err(ModelError::InvalidDescriptor(_))
        ));
        assert!(matches!(
            parse(&document(json!({ "min_pos_points": "many" }))),
            Err(ModelError::InvalidDescriptor(_))
        ));
    }
}
