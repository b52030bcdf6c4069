//! Validator configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file)
//! yields a usable configuration.
//!
//! ```toml
//! default_mode = "all_access"
//! rerun_on_selection_change = true
//!
//! [labels]
//! run_complete_title = "Validation complete"
//!
//! [labels.status]
//! fail = "Access is missing"
//! ```

use permval_core::{DisplayMode, StatusLabels};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder the unexpected-error template interpolates the exception type into
pub const EXCEPTION_TYPE_PLACEHOLDER: &str = "{0}";

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The TOML could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but is not usable
    #[error("Invalid configuration: {reason}")]
    Invalid {
        /// Why the configuration was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid-configuration error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// User-facing strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    /// Toast title when every feature has reported
    pub run_complete_title: String,
    /// Toast message when every feature has reported
    pub run_complete_description: String,
    /// Title for a failed feature catalog load
    pub feature_catalog_load_error: String,
    /// Title for a failed per-feature access check
    pub feature_results_load_error: String,
    /// Title for a failed profile catalog load
    pub profile_selector_load_error: String,
    /// Title for a failed permission set catalog load
    pub permission_set_selector_load_error: String,
    /// Title for a failed permission set group catalog load
    pub permission_set_group_selector_load_error: String,
    /// Message used when the backend reports an unhandled exception; `{0}` is the type
    pub unexpected_error: String,
    /// Description shown in all-access mode
    pub all_access_description: String,
    /// Description shown in missing-access-only mode
    pub missing_access_description: String,
    /// Pass/fail label on each feature result
    pub status: StatusLabels,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            run_complete_title: "Validation complete".to_string(),
            run_complete_description: "All features have been validated.".to_string(),
            feature_catalog_load_error: "Unable to load permission definitions".to_string(),
            feature_results_load_error: "Unable to load feature validation results".to_string(),
            profile_selector_load_error: "Unable to load profiles".to_string(),
            permission_set_selector_load_error: "Unable to load permission sets".to_string(),
            permission_set_group_selector_load_error: "Unable to load permission set groups"
                .to_string(),
            unexpected_error: "An unexpected error occurred: {0}".to_string(),
            all_access_description: "Showing all access for the selected principals.".to_string(),
            missing_access_description: "Showing only missing access for the selected principals."
                .to_string(),
            status: StatusLabels::default(),
        }
    }
}

impl Labels {
    /// Render the unexpected-error template for an exception type
    pub fn unexpected_error_for(&self, exception_type: &str) -> String {
        self.unexpected_error
            .replace(EXCEPTION_TYPE_PLACEHOLDER, exception_type)
    }

    /// Description for a display mode
    pub fn mode_description(&self, mode: DisplayMode) -> &str {
        match mode {
            DisplayMode::AllAccess => &self.all_access_description,
            DisplayMode::MissingAccessOnly => &self.missing_access_description,
        }
    }

    fn entries(&self) -> [(&'static str, &str); 12] {
        [
            ("run_complete_title", &self.run_complete_title),
            ("run_complete_description", &self.run_complete_description),
            ("feature_catalog_load_error", &self.feature_catalog_load_error),
            ("feature_results_load_error", &self.feature_results_load_error),
            ("profile_selector_load_error", &self.profile_selector_load_error),
            (
                "permission_set_selector_load_error",
                &self.permission_set_selector_load_error,
            ),
            (
                "permission_set_group_selector_load_error",
                &self.permission_set_group_selector_load_error,
            ),
            ("unexpected_error", &self.unexpected_error),
            ("all_access_description", &self.all_access_description),
            ("missing_access_description", &self.missing_access_description),
            ("status.pass", &self.status.pass),
            ("status.fail", &self.status.fail),
        ]
    }
}

/// Validator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Mode a new session starts in
    pub default_mode: DisplayMode,
    /// Restart the current run whenever the selection changes
    pub rerun_on_selection_change: bool,
    /// User-facing strings
    pub labels: Labels,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            default_mode: DisplayMode::MissingAccessOnly,
            rerun_on_selection_change: false,
            labels: Labels::default(),
        }
    }
}

impl ValidatorConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ValidatorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.labels.entries() {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(format!("label `{name}` is empty")));
            }
        }
        if !self
            .labels
            .unexpected_error
            .contains(EXCEPTION_TYPE_PLACEHOLDER)
        {
            return Err(ConfigError::invalid(format!(
                "label `unexpected_error` must contain {EXCEPTION_TYPE_PLACEHOLDER}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ValidatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, ValidatorConfig::default());
        assert_eq!(config.default_mode, DisplayMode::MissingAccessOnly);
    }

    #[test]
    fn partial_labels_keep_other_defaults() {
        let config = ValidatorConfig::from_toml_str(
            r#"
            default_mode = "all_access"
            rerun_on_selection_change = true

            [labels]
            run_complete_title = "Done"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_mode, DisplayMode::AllAccess);
        assert!(config.rerun_on_selection_change);
        assert_eq!(config.labels.run_complete_title, "Done");
        assert_eq!(
            config.labels.run_complete_description,
            Labels::default().run_complete_description
        );
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let err = ValidatorConfig::from_toml_str(
            r#"
            [labels]
            unexpected_error = "Something broke"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn empty_label_is_rejected() {
        let err = ValidatorConfig::from_toml_str(
            r#"
            [labels]
            run_complete_title = ""
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("run_complete_title"));
    }

    #[test]
    fn status_labels_are_configurable() {
        let config = ValidatorConfig::from_toml_str(
            r#"
            [labels.status]
            fail = "Zugriff fehlt"
            "#,
        )
        .unwrap();
        assert_eq!(config.labels.status.fail, "Zugriff fehlt");
        assert_eq!(config.labels.status.pass, StatusLabels::default().pass);

        let err = ValidatorConfig::from_toml_str(
            r#"
            [labels.status]
            pass = " "
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("status.pass"));
    }

    #[test]
    fn unexpected_error_interpolates_type() {
        let labels = Labels::default();
        assert_eq!(
            labels.unexpected_error_for("System.NullPointerException"),
            "An unexpected error occurred: System.NullPointerException"
        );
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ValidatorConfig::load(&dir.path().join("permval.toml")).unwrap();
        assert_eq!(config, ValidatorConfig::default());
    }
}
