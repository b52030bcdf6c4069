//! Fixture builders for records, selections and wired-up validators

use crate::catalogs::{StaticFeatureCatalog, StaticPrincipalCatalog};
use crate::checker::ControlledAccessChecker;
use crate::events::EventStream;
use permval_app::{
    Labels, RunContext, ValidationOrchestrator, ValidatorConfig, ValidatorServices,
    ValidatorSession,
};
use permval_core::{
    AccessFlag, DisplayMode, FeatureId, ItemGrantRecord, PrincipalOption, PrincipalSelection,
    SelectionAxis,
};
use std::sync::Arc;

/// Record with explicit read/create/edit/delete grants
pub fn record(item_id: &str, read: bool, create: bool, edit: bool, delete: bool) -> ItemGrantRecord {
    let api_name = item_id.rsplit('.').next().unwrap_or(item_id).to_string();
    ItemGrantRecord {
        item_id: item_id.to_string(),
        metadata_type: item_id.split('.').next().unwrap_or("Custom").to_string(),
        label: api_name.replace('_', " "),
        api_name,
        description: String::new(),
        read: AccessFlag::from_granted(read),
        create: AccessFlag::from_granted(create),
        edit: AccessFlag::from_granted(edit),
        delete: AccessFlag::from_granted(delete),
    }
}

/// Record with every flag granted
pub fn granted(item_id: &str) -> ItemGrantRecord {
    record(item_id, true, true, true, true)
}

/// Record with every flag denied
pub fn denied(item_id: &str) -> ItemGrantRecord {
    record(item_id, false, false, false, false)
}

/// Record granting read only
pub fn read_only(item_id: &str) -> ItemGrantRecord {
    record(item_id, true, false, false, false)
}

/// Feature ids in catalog order
pub fn features(ids: &[&str]) -> Vec<FeatureId> {
    ids.iter().map(|id| FeatureId::new(*id)).collect()
}

/// Principal options labelled after their ids
pub fn principal_options(ids: &[&str]) -> Vec<PrincipalOption> {
    ids.iter()
        .map(|id| PrincipalOption::new(*id, format!("{id} label")))
        .collect()
}

/// Run context selecting a single profile
pub fn profile_context(profile_id: &str, mode: DisplayMode) -> RunContext {
    RunContext::new(PrincipalSelection::with_profile(profile_id), mode)
}

/// Orchestrator over `checker` reporting to a fresh event stream
pub fn orchestrator_with(checker: ControlledAccessChecker) -> (ValidationOrchestrator, EventStream) {
    orchestrator_with_labels(checker, Labels::default())
}

/// [`orchestrator_with`], rendering user-facing strings from `labels`
pub fn orchestrator_with_labels(
    checker: ControlledAccessChecker,
    labels: Labels,
) -> (ValidationOrchestrator, EventStream) {
    let (sink, events) = EventStream::channel();
    let orchestrator = ValidationOrchestrator::new(Arc::new(checker), sink, labels);
    (orchestrator, events)
}

/// Principal catalog offering `P1`, `P2`, `PS1`, `PS2` and `PSG1`
pub fn sample_principals() -> StaticPrincipalCatalog {
    StaticPrincipalCatalog::new()
        .with_options(SelectionAxis::Profile, principal_options(&["P1", "P2"]))
        .with_options(SelectionAxis::PermissionSet, principal_options(&["PS1", "PS2"]))
        .with_options(SelectionAxis::PermissionSetGroup, principal_options(&["PSG1"]))
}

/// A session and the collaborators behind it
pub struct SessionHarness {
    /// The session under test
    pub session: ValidatorSession,
    /// Access checker the session's runs call
    pub checker: ControlledAccessChecker,
    /// Feature catalog the session fetches
    pub catalog: StaticFeatureCatalog,
    /// Events the session emitted
    pub events: EventStream,
}

impl SessionHarness {
    /// Session over `catalog` and [`sample_principals`], principals loaded
    pub async fn new(config: ValidatorConfig, catalog: StaticFeatureCatalog) -> Self {
        Self::with_principals(config, catalog, sample_principals()).await
    }

    /// Session over explicit catalogs, principals loaded
    pub async fn with_principals(
        config: ValidatorConfig,
        catalog: StaticFeatureCatalog,
        principals: StaticPrincipalCatalog,
    ) -> Self {
        let checker = ControlledAccessChecker::new();
        let (sink, events) = EventStream::channel();
        let services = ValidatorServices {
            checker: Arc::new(checker.clone()),
            features: Arc::new(catalog.clone()),
            principals: Arc::new(principals),
        };
        let mut session = ValidatorSession::new(config, services, sink).expect("valid session config");
        session.load_principals().await;
        Self {
            session,
            checker,
            catalog,
            events,
        }
    }
}
