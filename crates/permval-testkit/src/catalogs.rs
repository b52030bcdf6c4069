//! In-memory feature and principal catalogs

use async_trait::async_trait;
use parking_lot::Mutex;
use permval_core::{
    AccessCheckError, FeatureCatalogSource, FeatureId, PrincipalCatalog, PrincipalOption,
    SelectionAxis,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Feature catalog returning a fixed list, or a fixed error
#[derive(Clone)]
pub struct StaticFeatureCatalog {
    outcome: Arc<Mutex<Result<Vec<FeatureId>, AccessCheckError>>>,
    requests: Arc<AtomicUsize>,
}

impl StaticFeatureCatalog {
    /// Catalog listing `features` in order
    pub fn new<I, F>(features: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FeatureId>,
    {
        Self::with_outcome(Ok(features.into_iter().map(Into::into).collect()))
    }

    /// Catalog that always fails with `error`
    pub fn failing(error: AccessCheckError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<Vec<FeatureId>, AccessCheckError>) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(outcome)),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace what later requests return
    pub fn set_outcome(&self, outcome: Result<Vec<FeatureId>, AccessCheckError>) {
        *self.outcome.lock() = outcome;
    }

    /// Number of catalog requests served
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeatureCatalogSource for StaticFeatureCatalog {
    async fn list_feature_ids(&self) -> Result<Vec<FeatureId>, AccessCheckError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.outcome.lock().clone()
    }
}

/// Principal catalog with per-axis options or failures
#[derive(Clone, Default)]
pub struct StaticPrincipalCatalog {
    options: HashMap<SelectionAxis, Vec<PrincipalOption>>,
    failures: HashMap<SelectionAxis, AccessCheckError>,
}

impl StaticPrincipalCatalog {
    /// Catalog with no options on any axis
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `options` on an axis
    pub fn with_options(mut self, axis: SelectionAxis, options: Vec<PrincipalOption>) -> Self {
        self.options.insert(axis, options);
        self
    }

    /// Make an axis fail to load
    pub fn with_failure(mut self, axis: SelectionAxis, error: AccessCheckError) -> Self {
        self.failures.insert(axis, error);
        self
    }

    fn list(&self, axis: SelectionAxis) -> Result<Vec<PrincipalOption>, AccessCheckError> {
        if let Some(error) = self.failures.get(&axis) {
            return Err(error.clone());
        }
        Ok(self.options.get(&axis).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl PrincipalCatalog for StaticPrincipalCatalog {
    async fn list_profiles(&self) -> Result<Vec<PrincipalOption>, AccessCheckError> {
        self.list(SelectionAxis::Profile)
    }

    async fn list_permission_sets(&self) -> Result<Vec<PrincipalOption>, AccessCheckError> {
        self.list(SelectionAxis::PermissionSet)
    }

    async fn list_permission_set_groups(&self) -> Result<Vec<PrincipalOption>, AccessCheckError> {
        self.list(SelectionAxis::PermissionSetGroup)
    }
}
