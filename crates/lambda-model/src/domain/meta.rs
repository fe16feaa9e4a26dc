use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::constants::{META_ORIGIN, ORIGIN_LAMBDA};

/// Free-form key–value metadata attached to queued job records.
///
/// The queue is shared with other subsystems, so records are tagged with
/// [`META_ORIGIN`] and only records tagged [`ORIGIN_LAMBDA`] are treated as ours.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobMeta(pub BTreeMap<String, String>);

impl JobMeta {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Metadata tagged as originating from this subsystem.
    pub fn lambda() -> Self {
        let mut meta = Self::new();
        meta.insert(META_ORIGIN, ORIGIN_LAMBDA);
        meta
    }

    /// Returns `true` if no entries are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert or overwrite an entry.
    pub fn insert<K, V>(&mut self, key: K, val: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.insert(key.into(), val.into());
        self
    }

    /// Get the value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    /// Whether the record belongs to the auto-annotation subsystem.
    pub fn is_lambda(&self) -> bool {
        self.get(META_ORIGIN) == Some(ORIGIN_LAMBDA)
    }

    /// Iterate through all entries as `(&str, &str)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
