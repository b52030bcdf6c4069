//! Identifier types used across the validator
//!
//! Feature and principal identifiers are opaque strings handed out by the
//! backend. Run identifiers are minted locally and only ever increase.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Feature identifier
///
/// Names one logical grouping of metadata items whose access is validated
/// together. Opaque to the validator; only compared for equality and shown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub String);

impl FeatureId {
    /// Create a new feature ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Principal identifier
///
/// Identifies a profile, permission set or permission set group. The axis a
/// principal belongs to is carried by where the id is stored, not by the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    /// Create a new principal ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Validation run identifier
///
/// Every run started by the orchestrator gets the next value. A response is
/// applied only while its run identifier is the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl RunId {
    /// The identifier before any run has been started
    pub const INITIAL: RunId = RunId(0);

    /// The identifier following this one
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Get the raw counter value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

impl From<RunId> for u64 {
    fn from(id: RunId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_increase() {
        let first = RunId::INITIAL.next();
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.value(), 2);
        assert_eq!(second.to_string(), "run-2");
    }

    #[test]
    fn feature_id_serializes_as_plain_string() {
        let id = FeatureId::new("Advising");
        let encoded = serde_json::to_string(&id).unwrap();
        assert_eq!(encoded, "\"Advising\"");
    }
}
