use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Frame quality requested from the frame source.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Original,
    Compressed,
}

impl Quality {
    /// Resolve an optional caller-supplied quality; absent means original.
    pub fn resolve(value: Option<&str>) -> ModelResult<Self> {
        match value {
            None => Ok(Quality::Original),
            Some(v) => v.parse(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Original => "original",
            Quality::Compressed => "compressed",
        }
    }
}

impl FromStr for Quality {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(Quality::Original),
            "compressed" => Ok(Quality::Compressed),
            other => Err(ModelError::UnknownQuality(other.to_string())),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_quality_is_original() {
        assert_eq!(Quality::resolve(None).unwrap(), Quality::Original);
    }

    #[test]
    fn known_values_parse() {
        assert_eq!(Quality::resolve(Some("original")).unwrap(), Quality::Original);
        assert_eq!(
            Quality::resolve(Some("compressed")).unwrap(),
            Quality::Compressed
        );
    }

    #[test]
    fn unknown_value_is_rejected() {
        let err = Quality::resolve(Some("lossless")).unwrap_err();
        assert!(matches!(err, ModelError::UnknownQuality(v) if v == "lossless"));
    }
}
