//! Inference function descriptors.
//!
//! A descriptor is built from the metadata document a function registry
//! reports for each deployed function. Label and attribute names must be
//! unique inside one function; violating documents are rejected at load.

mod interactive;
pub use interactive::InteractiveConfig;

mod raw;

mod view;
pub use view::FunctionView;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{AttributeSpec, FunctionId},
    error::{ModelError, ModelResult},
    kind::FunctionKind,
};

/// Parsed and validated metadata of one inference function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub id: FunctionId,
    pub kind: FunctionKind,
    /// Label names in declaration order.
    pub labels: Vec<String>,
    /// Declared attributes per label name.
    pub attributes: BTreeMap<String, Vec<AttributeSpec>>,
    pub interactive: InteractiveConfig,
    pub version: u32,
    pub state: String,
    pub description: String,
    pub framework: Option<String>,
    /// Display name; falls back to `id`.
    pub name: String,
    /// Port the function listens on when invoked directly.
    pub port: Option<u16>,
}

impl FunctionDescriptor {
    /// Minimal descriptor without labels.
    pub fn new(id: impl Into<String>, kind: FunctionKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            labels: Vec::new(),
            attributes: BTreeMap::new(),
            interactive: InteractiveConfig::default(),
            version: 1,
            state: String::new(),
            description: String::new(),
            framework: None,
            port: None,
        }
    }

    /// Append a label with its declared attributes.
    ///
    /// No uniqueness check happens here; call [`FunctionDescriptor::validate`].
    pub fn with_label(mut self, name: impl Into<String>, attributes: Vec<AttributeSpec>) -> Self {
        let name = name.into();
        self.labels.push(name.clone());
        self.attributes.insert(name, attributes);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_interactive(mut self, interactive: InteractiveConfig) -> Self {
        self.interactive = interactive;
        self
    }

    /// Parse a registry metadata document and validate it.
    pub fn from_raw(value: &serde_json::Value) -> ModelResult<Self> {
        raw::parse(value)
    }

    /// Check label uniqueness and per-label attribute uniqueness.
    pub fn validate(&self) -> ModelResult<()> {
        let mut seen = BTreeSet::new();
        for label in &self.labels {
            if !seen.insert(label.as_str()) {
                return Err(ModelError::DuplicateLabel {
                    function: self.id.clone(),
                    label: label.clone(),
                });
            }
        }
        for (label, attrs) in &self.attributes {
            let mut seen = BTreeSet::new();
            for attr in attrs {
                if !seen.insert(attr.name.as_str()) {
                    return Err(ModelError::DuplicateAttribute {
                        function: self.id.clone(),
                        label: label.clone(),
                        attribute: attr.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Declared attributes of a label, empty when the label is unknown.
    pub fn attributes_of(&self, label: &str) -> &[AttributeSpec] {
        self.attributes.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Declared attribute of a label by name.
    pub fn attribute(&self, label: &str, name: &str) -> Option<&AttributeSpec> {
        self.attributes_of(label).iter().find(|a| a.name == name)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Shape returned to API consumers.
    pub fn view(&self) -> FunctionView {
        FunctionView::from(self)
    }
}
