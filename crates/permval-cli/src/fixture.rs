//! TOML fixture backend
//!
//! Serves the principal catalog, the feature catalog and per-feature access
//! checks from a fixture file. An item flag is granted for a selection when
//! any selected principal grants it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use permval_core::{
    AccessCheckError, AccessChecker, AccessFlag, DisplayMode, FeatureCatalogSource, FeatureId,
    ItemGrantRecord, PrincipalCatalog, PrincipalOption, PrincipalSelection,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One CRUD permission a principal can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantFlag {
    /// Read
    Read,
    /// Create
    Create,
    /// Edit
    Edit,
    /// Delete
    Delete,
}

#[derive(Debug, Clone, Deserialize)]
struct FixturePrincipal {
    id: String,
    label: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FixturePrincipals {
    profiles: Vec<FixturePrincipal>,
    permission_sets: Vec<FixturePrincipal>,
    permission_set_groups: Vec<FixturePrincipal>,
}

#[derive(Debug, Clone, Deserialize)]
struct FixtureItem {
    item_id: String,
    metadata_type: String,
    api_name: String,
    label: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    grants: BTreeMap<String, Vec<GrantFlag>>,
}

#[derive(Debug, Clone, Deserialize)]
struct FixtureFeature {
    id: String,
    #[serde(default)]
    fail: Option<String>,
    #[serde(default)]
    exception_type: Option<String>,
    #[serde(default)]
    items: Vec<FixtureItem>,
}

/// Parsed fixture file acting as the backend
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureBackend {
    #[serde(default)]
    principals: FixturePrincipals,
    #[serde(default)]
    catalog_error: Option<String>,
    #[serde(default)]
    features: Vec<FixtureFeature>,
}

impl FixtureBackend {
    /// Parse a fixture document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid fixture")
    }

    /// Load a fixture file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse fixture {}", path.display()))
    }

    fn feature(&self, feature_id: &FeatureId) -> Option<&FixtureFeature> {
        self.features
            .iter()
            .find(|feature| feature.id == feature_id.as_str())
    }
}

impl FixtureItem {
    fn effective(&self, selection: &PrincipalSelection) -> ItemGrantRecord {
        let granted = |flag: GrantFlag| {
            AccessFlag::from_granted(selection.all_ids().any(|principal| {
                self.grants
                    .get(principal.as_str())
                    .is_some_and(|flags| flags.contains(&flag))
            }))
        };
        ItemGrantRecord {
            item_id: self.item_id.clone(),
            metadata_type: self.metadata_type.clone(),
            api_name: self.api_name.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
            read: granted(GrantFlag::Read),
            create: granted(GrantFlag::Create),
            edit: granted(GrantFlag::Edit),
            delete: granted(GrantFlag::Delete),
        }
    }
}

fn options(principals: &[FixturePrincipal]) -> Vec<PrincipalOption> {
    principals
        .iter()
        .map(|principal| PrincipalOption::new(principal.id.as_str(), principal.label.as_str()))
        .collect()
}

#[async_trait]
impl AccessChecker for FixtureBackend {
    async fn check_feature_access(
        &self,
        feature_id: &FeatureId,
        mode: DisplayMode,
        selection: &PrincipalSelection,
    ) -> Result<Vec<ItemGrantRecord>, AccessCheckError> {
        let feature = self
            .feature(feature_id)
            .ok_or_else(|| AccessCheckError::handled(format!("No permission definition for {feature_id}")))?;

        match (&feature.exception_type, &feature.fail) {
            (Some(exception_type), message) => {
                return Err(AccessCheckError::unexpected(
                    exception_type.as_str(),
                    message.clone().unwrap_or_default(),
                ));
            }
            (None, Some(message)) => return Err(AccessCheckError::handled(message.as_str())),
            (None, None) => {}
        }

        Ok(feature
            .items
            .iter()
            .map(|item| item.effective(selection))
            .filter(|record| mode.show_all() || record.has_denied())
            .collect())
    }
}

#[async_trait]
impl FeatureCatalogSource for FixtureBackend {
    async fn list_feature_ids(&self) -> Result<Vec<FeatureId>, AccessCheckError> {
        if let Some(message) = &self.catalog_error {
            return Err(AccessCheckError::handled(message.as_str()));
        }
        Ok(self
            .features
            .iter()
            .map(|feature| FeatureId::new(feature.id.as_str()))
            .collect())
    }
}

#[async_trait]
impl PrincipalCatalog for FixtureBackend {
    async fn list_profiles(&self) -> Result<Vec<PrincipalOption>, AccessCheckError> {
        Ok(options(&self.principals.profiles))
    }

    async fn list_permission_sets(&self) -> Result<Vec<PrincipalOption>, AccessCheckError> {
        Ok(options(&self.principals.permission_sets))
    }

    async fn list_permission_set_groups(&self) -> Result<Vec<PrincipalOption>, AccessCheckError> {
        Ok(options(&self.principals.permission_set_groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
[principals]
profiles = [{ id = "P1", label = "Standard User" }]
permission_sets = [{ id = "PS1", label = "Invoice Editor" }]

[[features]]
id = "Invoicing"

[[features.items]]
item_id = "Custom Object.Invoice__c"
metadata_type = "Custom Object"
api_name = "Invoice__c"
label = "Invoice"

[features.items.grants]
P1 = ["read"]
PS1 = ["create", "edit"]

[[features.items]]
item_id = "Apex Class.InvoiceController"
metadata_type = "Apex Class"
api_name = "InvoiceController"
label = "InvoiceController"

[features.items.grants]
P1 = ["read", "create", "edit", "delete"]

[[features]]
id = "Payments"
exception_type = "System.QueryException"
fail = "List has no rows"
"#;

    #[tokio::test]
    async fn grants_are_unioned_across_principals() {
        let backend = FixtureBackend::from_toml_str(FIXTURE).unwrap();
        let selection = PrincipalSelection::with_profile("P1").with_permission_sets(["PS1"]);

        let records = backend
            .check_feature_access(&FeatureId::new("Invoicing"), DisplayMode::AllAccess, &selection)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        let invoice = &records[0];
        assert!(invoice.read.is_granted());
        assert!(invoice.create.is_granted());
        assert!(invoice.edit.is_granted());
        assert!(!invoice.delete.is_granted());
    }

    #[tokio::test]
    async fn missing_mode_returns_only_denied_items() {
        let backend = FixtureBackend::from_toml_str(FIXTURE).unwrap();
        let selection = PrincipalSelection::with_profile("P1");

        let records = backend
            .check_feature_access(
                &FeatureId::new("Invoicing"),
                DisplayMode::MissingAccessOnly,
                &selection,
            )
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].api_name, "Invoice__c");
    }

    #[tokio::test]
    async fn marked_features_fail() {
        let backend = FixtureBackend::from_toml_str(FIXTURE).unwrap();
        let selection = PrincipalSelection::with_profile("P1");

        let error = backend
            .check_feature_access(&FeatureId::new("Payments"), DisplayMode::AllAccess, &selection)
            .await
            .unwrap_err();
        assert_eq!(error.exception_type.as_deref(), Some("System.QueryException"));

        let catalog = backend.list_feature_ids().await.unwrap();
        assert_eq!(catalog, vec![FeatureId::new("Invoicing"), FeatureId::new("Payments")]);
        assert_eq!(backend.list_profiles().await.unwrap().len(), 1);
        assert!(backend.list_permission_set_groups().await.unwrap().is_empty());
    }
}
