//! Error taxonomy for permission validation
//!
//! - [`SelectionError`]: a run was requested against an unusable selection;
//!   rejected before any request is issued.
//! - [`AccessCheckError`]: one feature's backend call failed; recorded on that
//!   feature only.
//! - [`CatalogError`]: the feature or principal catalog could not be used.
//!
//! Stale responses from superseded runs are not errors; the orchestrator
//! drops them silently.

use crate::types::{FeatureId, PrincipalId, SelectionAxis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised by selection handling
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum SelectionError {
    /// No profile, permission set or permission set group is selected
    #[error("Select a profile, permission set or permission set group before running")]
    Empty,

    /// The id is not offered by the catalog for this axis
    #[error("Unknown {axis}: {id}")]
    UnknownPrincipal {
        /// Axis the id was selected on
        axis: SelectionAxis,
        /// The rejected id
        id: PrincipalId,
    },
}

/// Failure reported by the access checker for one feature.
///
/// Mirrors the backend error body: a message plus an optional exception type.
/// When the exception type is present the message is an internal detail and
/// is not shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCheckError {
    /// Backend message
    pub message: String,
    /// Structured exception type discriminator
    pub exception_type: Option<String>,
}

impl AccessCheckError {
    /// A handled failure carrying a user-facing message
    pub fn handled(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exception_type: None,
        }
    }

    /// An unhandled backend exception of the given type
    pub fn unexpected(exception_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exception_type: Some(exception_type.into()),
        }
    }

    /// The message that may be shown to a user, if there is one
    pub fn human_message(&self) -> Option<&str> {
        if self.exception_type.is_some() || self.message.trim().is_empty() {
            return None;
        }
        Some(&self.message)
    }
}

impl fmt::Display for AccessCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.exception_type {
            Some(kind) => write!(f, "Access check failed: {kind}: {}", self.message),
            None => write!(f, "Access check failed: {}", self.message),
        }
    }
}

impl std::error::Error for AccessCheckError {}

/// Errors raised while obtaining or validating a catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum CatalogError {
    /// The catalog lists the same feature twice
    #[error("Feature catalog lists {0} more than once")]
    DuplicateFeature(FeatureId),

    /// The catalog source failed
    #[error("Catalog unavailable: {0}")]
    Unavailable(AccessCheckError),
}

impl CatalogError {
    /// Wrap a backend failure
    pub fn unavailable(error: AccessCheckError) -> Self {
        Self::Unavailable(error)
    }
}
