//! Correlation types for request tracking
//!
//! A `RequestId` identifies one operation invocation. Callers usually choose
//! it themselves; when they don't, a time-ordered UUIDv7 is generated so that
//! invocation handles stay unique within the process.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a single invocation request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random RequestId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from a caller-chosen string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Use the caller-chosen id, or generate one when it is blank
    pub fn or_generate(s: Option<String>) -> Self {
        match s {
            Some(s) if !s.trim().is_empty() => Self(s),
            _ => Self::new(),
        }
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
