//! Display mode for a validation run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which rows a feature's result model carries.
///
/// The mode is global to a run: switching it invalidates the run and all of
/// its per-feature results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Every item is listed, granted or not
    AllAccess,
    /// Only items with at least one denied flag are listed
    #[default]
    MissingAccessOnly,
}

impl DisplayMode {
    /// Whether the backend should return every item for this mode
    pub fn show_all(self) -> bool {
        matches!(self, Self::AllAccess)
    }

    /// Short machine-friendly name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllAccess => "all_access",
            Self::MissingAccessOnly => "missing_access_only",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "all_access" | "allaccess" => Ok(Self::AllAccess),
            "missing" | "missing_access_only" | "onlymissingaccess" => {
                Ok(Self::MissingAccessOnly)
            }
            other => Err(format!("unknown display mode: {other}")),
        }
    }
}
