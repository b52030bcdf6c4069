//! Permval Core - Permission Validation Domain Model
//!
//! This crate holds the pieces of the permissions validator that carry no
//! runtime state: identifiers, the principal selection, per-item access
//! grants, the display model produced for each feature, the error taxonomy,
//! and the traits behind which the external collaborators live.
//!
//! # Architecture
//!
//! ```text
//! PrincipalCatalog ──▶ PrincipalSelection ─┐
//!                                          ├──▶ AccessChecker ──▶ aggregate() ──▶ FeatureResultModel
//! FeatureCatalogSource ──▶ [FeatureId] ────┘
//! ```
//!
//! The stateful engine (orchestration, completion tracking, mode switching)
//! lives in `permval-app`; everything here is either a plain value or a pure
//! function of its inputs.

#![forbid(unsafe_code)]

/// Identifiers, selections, display modes and access models
pub mod types;

/// Pure conversion of raw per-item grants into a feature display model
pub mod aggregator;

/// Collaborator interfaces (access checks, feature and principal catalogs)
pub mod effects;

/// Error taxonomy
pub mod errors;

pub use aggregator::{aggregate, aggregate_with_labels};
pub use effects::{AccessChecker, FeatureCatalogSource, PrincipalCatalog, PrincipalOption};
pub use errors::{AccessCheckError, CatalogError, SelectionError};
pub use types::{
    AccessFlag, AccessRow, DisplayMode, FeatureId, FeatureResultModel, ItemGrantRecord,
    OverallStatus, PrincipalId, PrincipalSelection, RunId, SelectionAxis, StatusIcon, StatusLabels,
};
