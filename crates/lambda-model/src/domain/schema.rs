use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{AttributeId, InputType, LabelId};

/// Attribute of a task label as stored in the task schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAttribute {
    pub id: AttributeId,
    pub input_type: InputType,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A task label with its attributes keyed by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLabel {
    pub id: LabelId,
    #[serde(default)]
    pub attributes: BTreeMap<String, TaskAttribute>,
}

impl TaskLabel {
    pub fn new(id: LabelId) -> Self {
        Self {
            id,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        id: AttributeId,
        input_type: InputType,
        values: &[&str],
    ) -> Self {
        self.attributes.insert(
            name.into(),
            TaskAttribute {
                id,
                input_type,
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        );
        self
    }

    /// Spec id of an attribute by name.
    pub fn attribute_id(&self, name: &str) -> Option<AttributeId> {
        self.attributes.get(name).map(|a| a.id)
    }
}

/// Snapshot of a task's label vocabulary, keyed by label name.
///
/// Taken once per run and never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskLabelSchema(BTreeMap<String, TaskLabel>);

impl TaskLabelSchema {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with_label(mut self, name: impl Into<String>, label: TaskLabel) -> Self {
        self.0.insert(name.into(), label);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, label: TaskLabel) {
        self.0.insert(name.into(), label);
    }

    pub fn get(&self, name: &str) -> Option<&TaskLabel> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskLabel)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
