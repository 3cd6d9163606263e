//! Tag values and backend tag diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar tag value.
///
/// Tags are name → scalar pairs; the backend accepts strings, integers and
/// booleans. Serialized untagged so the wire shape is the bare scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// String tag.
    String(String),
    /// Integer tag.
    Int(i64),
    /// Boolean tag.
    Bool(bool),
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for TagValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A tag the backend rejected, with its reason.
///
/// Returned in the `skipped` array of a tag-update response. An absent or
/// empty array means every tag was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTag {
    /// The rejected tag name.
    pub tag: String,
    /// Human-readable rejection reason from the backend.
    pub reason: String,
}
