use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

/// Caller-supplied target for one function label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct LabelMappingEntry {
    /// Task label name.
    pub name: String,
    /// Function attribute name to task attribute name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl LabelMappingEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.attributes.insert(from.into(), to.into());
        self
    }
}

/// Partial mapping from function labels to task labels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(transparent)]
pub struct MappingRequest(pub BTreeMap<String, LabelMappingEntry>);

impl MappingRequest {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, function_label: impl Into<String>, entry: LabelMappingEntry) -> Self {
        self.0.insert(function_label.into(), entry);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelMappingEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
