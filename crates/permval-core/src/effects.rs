//! Collaborator Interfaces
//!
//! The validator never computes grants itself. These traits are the seams
//! behind which the backend lives:
//!
//! - [`AccessChecker`]: per-feature CRUD grants for a principal selection
//! - [`FeatureCatalogSource`]: the ordered list of features to validate
//! - [`PrincipalCatalog`]: the read-only lists the selectors offer
//!
//! Implementations own their timeout policy. A call that never resolves
//! leaves its feature in flight indefinitely.

use crate::errors::AccessCheckError;
use crate::types::{DisplayMode, FeatureId, ItemGrantRecord, PrincipalId, PrincipalSelection};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Computes per-item access grants for one feature
#[async_trait]
pub trait AccessChecker: Send + Sync {
    /// Check every item of `feature_id` against `selection`.
    ///
    /// Under [`DisplayMode::MissingAccessOnly`] the backend may omit fully
    /// granted items.
    async fn check_feature_access(
        &self,
        feature_id: &FeatureId,
        mode: DisplayMode,
        selection: &PrincipalSelection,
    ) -> Result<Vec<ItemGrantRecord>, AccessCheckError>;
}

/// Lists the features a validation run covers
#[async_trait]
pub trait FeatureCatalogSource: Send + Sync {
    /// Ordered feature identifiers; fetched once per run
    async fn list_feature_ids(&self) -> Result<Vec<FeatureId>, AccessCheckError>;
}

/// One selectable principal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalOption {
    /// Principal identifier
    pub id: PrincipalId,
    /// Display label
    pub label: String,
}

impl PrincipalOption {
    /// Create a new option
    pub fn new(id: impl Into<PrincipalId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Read-only source of the principals offered on each selection axis
#[async_trait]
pub trait PrincipalCatalog: Send + Sync {
    /// Profiles available for selection
    async fn list_profiles(&self) -> Result<Vec<PrincipalOption>, AccessCheckError>;

    /// Permission sets available for selection
    async fn list_permission_sets(&self) -> Result<Vec<PrincipalOption>, AccessCheckError>;

    /// Permission set groups available for selection
    async fn list_permission_set_groups(&self)
        -> Result<Vec<PrincipalOption>, AccessCheckError>;
}
