//! Per-item access grants and the per-feature display model.

use super::identifiers::FeatureId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One CRUD flag on one metadata item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessFlag {
    /// The selected principals grant this access
    Granted,
    /// None of the selected principals grant this access
    Denied,
}

impl AccessFlag {
    /// Flag from a boolean grant
    pub fn from_granted(granted: bool) -> Self {
        if granted {
            Self::Granted
        } else {
            Self::Denied
        }
    }

    /// Whether this flag is granted
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl fmt::Display for AccessFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
        }
    }
}

/// Item-level grant record as returned by the access checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGrantRecord {
    /// Backend identifier for the item (e.g. `Apex Class.MyController`)
    pub item_id: String,
    /// Metadata type (Apex class, object, field, ...)
    pub metadata_type: String,
    /// API name of the item
    pub api_name: String,
    /// Human label
    pub label: String,
    /// Backend-provided description of the access situation
    pub description: String,
    /// Read access
    pub read: AccessFlag,
    /// Create access
    pub create: AccessFlag,
    /// Edit access
    pub edit: AccessFlag,
    /// Delete access
    pub delete: AccessFlag,
}

impl ItemGrantRecord {
    /// The four flags in read/create/edit/delete order
    pub fn flags(&self) -> [AccessFlag; 4] {
        [self.read, self.create, self.edit, self.delete]
    }

    /// True iff all four flags are granted
    pub fn fully_granted(&self) -> bool {
        self.flags().iter().all(|flag| flag.is_granted())
    }

    /// True iff at least one flag is denied
    pub fn has_denied(&self) -> bool {
        !self.fully_granted()
    }
}

/// Pass/fail outcome of a feature or row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverallStatus {
    /// No denied access
    Pass,
    /// At least one denied flag
    Fail,
}

impl OverallStatus {
    /// Icon paired with this status
    pub fn icon(self) -> StatusIcon {
        match self {
            Self::Pass => StatusIcon::Success,
            Self::Fail => StatusIcon::Error,
        }
    }
}

/// Labels paired with each [`OverallStatus`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusLabels {
    /// Label for [`OverallStatus::Pass`]
    pub pass: String,
    /// Label for [`OverallStatus::Fail`]
    pub fail: String,
}

impl StatusLabels {
    /// Label for a status
    pub fn label(&self, status: OverallStatus) -> &str {
        match status {
            OverallStatus::Pass => &self.pass,
            OverallStatus::Fail => &self.fail,
        }
    }
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            pass: "You have the required access".to_string(),
            fail: "Access is missing".to_string(),
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "Pass"),
            Self::Fail => write!(f, "Fail"),
        }
    }
}

/// Card icon for a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusIcon {
    /// All access present
    Success,
    /// Access missing, or the check failed
    Error,
    /// Result not yet available
    Loading,
}

impl StatusIcon {
    /// Icon name understood by the rendering layer
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "utility:success",
            Self::Error => "utility:error",
            Self::Loading => "standard:generic_loading",
        }
    }
}

impl fmt::Display for StatusIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One table row of a feature's display model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRow {
    /// Backend identifier for the item
    pub item_id: String,
    /// Metadata type
    pub metadata_type: String,
    /// API name
    pub api_name: String,
    /// Human label
    pub label: String,
    /// Description
    pub description: String,
    /// Read access
    pub read: AccessFlag,
    /// Create access
    pub create: AccessFlag,
    /// Edit access
    pub edit: AccessFlag,
    /// Delete access
    pub delete: AccessFlag,
}

impl AccessRow {
    /// The four flags in read/create/edit/delete order
    pub fn flags(&self) -> [AccessFlag; 4] {
        [self.read, self.create, self.edit, self.delete]
    }

    /// Pass iff all four flags are granted
    pub fn status(&self) -> OverallStatus {
        if self.flags().iter().all(|flag| flag.is_granted()) {
            OverallStatus::Pass
        } else {
            OverallStatus::Fail
        }
    }
}

impl From<ItemGrantRecord> for AccessRow {
    fn from(record: ItemGrantRecord) -> Self {
        Self {
            item_id: record.item_id,
            metadata_type: record.metadata_type,
            api_name: record.api_name,
            label: record.label,
            description: record.description,
            read: record.read,
            create: record.create,
            edit: record.edit,
            delete: record.delete,
        }
    }
}

/// Display model for one feature under one display mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureResultModel {
    /// Feature this model belongs to
    pub feature_id: FeatureId,
    /// Fail iff any input row had a denied flag
    pub overall_status: OverallStatus,
    /// Icon determined by `overall_status`
    pub icon: StatusIcon,
    /// Label determined by `overall_status`
    pub status_label: String,
    /// Rows to display, in backend order
    pub rows: Vec<AccessRow>,
}

impl FeatureResultModel {
    /// Whether the feature is missing any access
    pub fn has_missing_access(&self) -> bool {
        self.overall_status == OverallStatus::Fail
    }

    /// Whether there is a table to show
    pub fn show_table(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Number of rows with at least one denied flag
    pub fn denied_row_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.status() == OverallStatus::Fail)
            .count()
    }
}
