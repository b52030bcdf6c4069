//! Core value types for permission validation.

pub mod access;
pub mod identifiers;
pub mod mode;
pub mod selection;

pub use access::{
    AccessFlag, AccessRow, FeatureResultModel, ItemGrantRecord, OverallStatus, StatusIcon,
    StatusLabels,
};
pub use identifiers::{FeatureId, PrincipalId, RunId};
pub use mode::DisplayMode;
pub use selection::{PrincipalSelection, SelectionAxis};
