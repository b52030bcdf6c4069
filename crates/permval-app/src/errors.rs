//! Application-level errors
//!
//! Per-feature access-check failures never surface here: they are recorded on
//! the feature and reported as a toast. Only failures that prevent a run from
//! starting are returned to the caller.

use crate::config::ConfigError;
use permval_core::{CatalogError, SelectionError};

/// Errors returned by the validator engine
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    /// The selection cannot be used
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// The feature catalog cannot be used
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Runs spawn their requests on the ambient Tokio runtime
    #[error("No Tokio runtime is available to issue access checks")]
    NoRuntime,

    /// Configuration problem
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias for validator operations
pub type ValidatorResult<T> = Result<T, ValidatorError>;
