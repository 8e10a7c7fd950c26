use alloc::{
    string::{String, ToString as _},
    vec::Vec,
};
use serde::{Deserialize, Serialize};

use crate::errors::CacheErrorKind;

/// Constructor parameter with its declared dependency type.
///
/// An empty `declared_type` means the parameter has no usable named type
/// (untyped or a builtin), so it can't be autowired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: String,
}

impl ParameterSpec {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_untyped(&self) -> bool {
        self.declared_type.is_empty()
    }
}

/// Structural description of a type's constructor.
/// `parameters` keep declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorAnalysis {
    pub has_constructor: bool,
    pub is_instantiable: bool,
    pub constructor_is_private: bool,
    pub parameters: Vec<ParameterSpec>,
}

/// Where a type is defined and a comparable change marker for that definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMarker {
    pub location: String,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CacheEntry {
    pub(crate) source_location: String,
    pub(crate) source_version: u64,
    #[serde(flatten)]
    pub(crate) analysis: ConstructorAnalysis,
}

impl CacheEntry {
    #[inline]
    #[must_use]
    pub(crate) fn new(marker: &SourceMarker, analysis: ConstructorAnalysis) -> Self {
        Self {
            source_location: marker.location.clone(),
            source_version: marker.version,
            analysis,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_fresh(&self, marker: &SourceMarker) -> bool {
        self.source_location == marker.location && self.source_version == marker.version
    }

    pub(crate) fn encode(&self, key: &str) -> Result<String, CacheErrorKind> {
        serde_json::to_string(self).map_err(|source| CacheErrorKind::Encode {
            key: key.to_string(),
            source,
        })
    }

    /// Returns `None` for anything that isn't a well-formed entry
    #[must_use]
    pub(crate) fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}
