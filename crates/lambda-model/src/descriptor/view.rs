use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::{descriptor::FunctionDescriptor, domain::AttributeSpec, kind::FunctionKind};

/// Public representation of a function, with kind-specific fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct FunctionView {
    pub id: String,
    #[cfg_attr(feature = "schema", schemars(with = "String"))]
    pub kind: FunctionKind,
    pub labels: Vec<String>,
    pub description: String,
    pub framework: Option<String>,
    pub name: String,
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_pos_points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_neg_points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startswith_box: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated_gif: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "schema", schemars(skip))]
    pub attributes: Option<BTreeMap<String, Vec<AttributeSpec>>>,
}

impl From<&FunctionDescriptor> for FunctionView {
    fn from(desc: &FunctionDescriptor) -> Self {
        let mut view = FunctionView {
            id: desc.id.clone(),
            kind: desc.kind,
            labels: desc.labels.clone(),
            description: desc.description.clone(),
            framework: desc.framework.clone(),
            name: desc.name.clone(),
            version: desc.version,
            min_pos_points: None,
            min_neg_points: None,
            startswith_box: None,
            help_message: None,
            animated_gif: None,
            state: None,
            attributes: None,
        };

        match desc.kind {
            FunctionKind::Interactor => {
                let hints = &desc.interactive;
                view.min_pos_points = Some(hints.min_pos_points);
                view.min_neg_points = Some(hints.min_neg_points);
                view.startswith_box = Some(hints.startswith_box);
                view.help_message = Some(hints.help_message.clone());
                view.animated_gif = Some(hints.animated_gif.clone());
            }
            FunctionKind::Tracker => view.state = Some(desc.state.clone()),
            FunctionKind::Detector => view.attributes = Some(desc.attributes.clone()),
            FunctionKind::Reid | FunctionKind::Unknown => {}
        }
        view
    }
}
