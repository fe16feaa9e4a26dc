use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Widget type of an attribute, shared by function vocabularies and task schemas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Number,
    Checkbox,
    Select,
    Radio,
    Text,
}

impl InputType {
    /// Returns the input type as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Number => "number",
            InputType::Checkbox => "checkbox",
            InputType::Select => "select",
            InputType::Radio => "radio",
            InputType::Text => "text",
        }
    }
}

impl FromStr for InputType {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" => Ok(InputType::Number),
            "checkbox" => Ok(InputType::Checkbox),
            "select" => Ok(InputType::Select),
            "radio" => Ok(InputType::Radio),
            "text" => Ok(InputType::Text),
            other => Err(ModelError::UnknownInputType(other.to_string())),
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute declared by an inference function for one of its labels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    pub input_type: InputType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, input_type: InputType) -> Self {
        Self {
            name: name.into(),
            input_type,
            values: Vec::new(),
        }
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }
}
