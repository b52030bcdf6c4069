//! # Principal Selection
//!
//! The security principals a validation run is evaluated against: at most one
//! profile plus any number of permission sets and permission set groups.

use super::identifiers::PrincipalId;
use crate::errors::SelectionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One of the three independent selection axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionAxis {
    /// Single profile (at most one)
    Profile,
    /// Permission sets
    PermissionSet,
    /// Permission set groups
    PermissionSetGroup,
}

impl SelectionAxis {
    /// All axes in display order
    pub const ALL: [SelectionAxis; 3] = [
        SelectionAxis::Profile,
        SelectionAxis::PermissionSet,
        SelectionAxis::PermissionSetGroup,
    ];

    /// Maximum number of principals that may be selected on this axis
    pub fn max_selected(self) -> Option<usize> {
        match self {
            Self::Profile => Some(1),
            Self::PermissionSet | Self::PermissionSetGroup => None,
        }
    }
}

impl fmt::Display for SelectionAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => write!(f, "profile"),
            Self::PermissionSet => write!(f, "permission set"),
            Self::PermissionSetGroup => write!(f, "permission set group"),
        }
    }
}

/// The principal combination a run validates against.
///
/// Invariants:
/// - `profile_id` holds at most one value (enforced by the type)
/// - the set-valued fields hold no duplicates and carry no meaningful order
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalSelection {
    /// Selected profile, if any
    pub profile_id: Option<PrincipalId>,
    /// Selected permission sets
    pub permission_set_ids: BTreeSet<PrincipalId>,
    /// Selected permission set groups
    pub permission_set_group_ids: BTreeSet<PrincipalId>,
}

impl PrincipalSelection {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection holding only a profile
    pub fn with_profile(profile_id: impl Into<PrincipalId>) -> Self {
        Self {
            profile_id: Some(profile_id.into()),
            ..Self::default()
        }
    }

    /// Replace the permission sets.
    #[must_use]
    pub fn with_permission_sets<I, P>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PrincipalId>,
    {
        self.permission_set_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the permission set groups.
    #[must_use]
    pub fn with_permission_set_groups<I, P>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PrincipalId>,
    {
        self.permission_set_group_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// True iff no principal is selected on any axis
    pub fn is_empty(&self) -> bool {
        self.profile_id.is_none()
            && self.permission_set_ids.is_empty()
            && self.permission_set_group_ids.is_empty()
    }

    /// Reject an empty selection
    pub fn ensure_not_empty(&self) -> Result<(), SelectionError> {
        if self.is_empty() {
            return Err(SelectionError::Empty);
        }
        Ok(())
    }

    /// Total number of selected principals across all axes
    pub fn principal_count(&self) -> usize {
        usize::from(self.profile_id.is_some())
            + self.permission_set_ids.len()
            + self.permission_set_group_ids.len()
    }

    /// Selected ids on one axis
    pub fn ids_for(&self, axis: SelectionAxis) -> Vec<&PrincipalId> {
        match axis {
            SelectionAxis::Profile => self.profile_id.iter().collect(),
            SelectionAxis::PermissionSet => self.permission_set_ids.iter().collect(),
            SelectionAxis::PermissionSetGroup => self.permission_set_group_ids.iter().collect(),
        }
    }

    /// Every selected principal, profile first
    pub fn all_ids(&self) -> impl Iterator<Item = &PrincipalId> {
        self.profile_id
            .iter()
            .chain(self.permission_set_ids.iter())
            .chain(self.permission_set_group_ids.iter())
    }
}
