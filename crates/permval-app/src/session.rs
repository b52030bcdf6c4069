//! Validator session
//!
//! Screen-level coordinator: owns the selector, the mode controller and the
//! orchestrator, fetches the feature catalog for each run, and turns catalog
//! failures into toasts. With `rerun_on_selection_change` enabled it also
//! keeps a [`SelectionWatcher`] that restarts the current run whenever the
//! selection changes.

use crate::config::ValidatorConfig;
use crate::error_format::format_for_toast;
use crate::errors::{ValidatorError, ValidatorResult};
use crate::mode::{ModeChange, ModeController};
use crate::notifications::{ValidatorEvent, ValidatorSink};
use crate::orchestrator::{RunContext, ValidationOrchestrator};
use crate::run_state::{RunProgress, RunSnapshot};
use crate::selector::{LoadReport, PrincipalSelector, SelectionChanged};
use permval_core::{
    AccessChecker, CatalogError, DisplayMode, FeatureCatalogSource, PrincipalCatalog,
    PrincipalId, PrincipalSelection, RunId, SelectionAxis, SelectionError,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Backend collaborators a session talks to
#[derive(Clone)]
pub struct ValidatorServices {
    /// Per-feature access checks
    pub checker: Arc<dyn AccessChecker>,
    /// Feature catalog
    pub features: Arc<dyn FeatureCatalogSource>,
    /// Principal catalog for the selectors
    pub principals: Arc<dyn PrincipalCatalog>,
}

/// Restarts the current run when the selection changes
///
/// Only the latest selection is acted on; changes made while the watcher was
/// not scheduled collapse into one. The task is aborted when the watcher is
/// dropped.
pub struct SelectionWatcher {
    task: JoinHandle<()>,
}

impl SelectionWatcher {
    /// Spawn a watcher over `changes`
    pub fn spawn(
        runtime: &Handle,
        mut changes: watch::Receiver<Option<SelectionChanged>>,
        orchestrator: ValidationOrchestrator,
    ) -> Self {
        let task = runtime.spawn(async move {
            while changes.changed().await.is_ok() {
                let latest = changes.borrow_and_update().clone();
                if let Some(change) = latest {
                    rerun_for_selection(&orchestrator, change);
                }
            }
            debug!("selection watcher stopped");
        });
        Self { task }
    }
}

impl Drop for SelectionWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn rerun_for_selection(orchestrator: &ValidationOrchestrator, change: SelectionChanged) {
    let Some(current) = orchestrator.active_context() else {
        return;
    };
    if current.selection == change.selection {
        return;
    }
    if change.selection.is_empty() {
        orchestrator.cancel_run();
        return;
    }

    match orchestrator.restart_with(RunContext::new(change.selection, current.mode)) {
        Ok(Some(run_id)) => info!(%run_id, axis = %change.axis, "run restarted for new selection"),
        Ok(None) => {}
        Err(error) => warn!(%error, "could not restart run for new selection"),
    }
}

/// One permissions-validator screen
pub struct ValidatorSession {
    config: ValidatorConfig,
    selector: PrincipalSelector,
    mode: ModeController,
    orchestrator: ValidationOrchestrator,
    features: Arc<dyn FeatureCatalogSource>,
    principals: Arc<dyn PrincipalCatalog>,
    sink: Arc<dyn ValidatorSink>,
    watcher: Option<SelectionWatcher>,
}

impl ValidatorSession {
    /// Create a session.
    ///
    /// Requires a Tokio runtime when `rerun_on_selection_change` is enabled.
    pub fn new(
        config: ValidatorConfig,
        services: ValidatorServices,
        sink: Arc<dyn ValidatorSink>,
    ) -> ValidatorResult<Self> {
        config.validate()?;
        let orchestrator =
            ValidationOrchestrator::new(services.checker, Arc::clone(&sink), config.labels.clone());
        let selector = PrincipalSelector::new();

        let watcher = if config.rerun_on_selection_change {
            let runtime = Handle::try_current().map_err(|_| ValidatorError::NoRuntime)?;
            Some(SelectionWatcher::spawn(
                &runtime,
                selector.subscribe(),
                orchestrator.clone(),
            ))
        } else {
            None
        };

        Ok(Self {
            mode: ModeController::new(config.default_mode),
            config,
            selector,
            orchestrator,
            features: services.features,
            principals: services.principals,
            sink,
            watcher,
        })
    }

    /// Load the selector options; each failed axis is reported as a toast
    pub async fn load_principals(&mut self) -> LoadReport {
        let report = self.selector.load(self.principals.as_ref()).await;
        let labels = &self.config.labels;
        for (axis, error) in &report.failures {
            let title = match axis {
                SelectionAxis::Profile => &labels.profile_selector_load_error,
                SelectionAxis::PermissionSet => &labels.permission_set_selector_load_error,
                SelectionAxis::PermissionSetGroup => {
                    &labels.permission_set_group_selector_load_error
                }
            };
            self.sink
                .emit(ValidatorEvent::Toast(format_for_toast(error, title.clone(), labels)));
        }
        report
    }

    /// Select one profile, or none
    pub fn select_profile(&mut self, profile_id: Option<PrincipalId>) -> Result<(), SelectionError> {
        let change = self.selector.select_profile(profile_id)?;
        self.sink.emit(ValidatorEvent::SelectionChanged(change));
        Ok(())
    }

    /// Replace the selected permission sets
    pub fn select_permission_sets(&mut self, ids: BTreeSet<PrincipalId>) -> Result<(), SelectionError> {
        let change = self.selector.select_permission_sets(ids)?;
        self.sink.emit(ValidatorEvent::SelectionChanged(change));
        Ok(())
    }

    /// Replace the selected permission set groups
    pub fn select_permission_set_groups(
        &mut self,
        ids: BTreeSet<PrincipalId>,
    ) -> Result<(), SelectionError> {
        let change = self.selector.select_permission_set_groups(ids)?;
        self.sink.emit(ValidatorEvent::SelectionChanged(change));
        Ok(())
    }

    /// Whether the run action is enabled
    pub fn can_run(&self) -> bool {
        self.selector.can_run()
    }

    /// Fetch the feature catalog and start a run over it.
    ///
    /// An empty selection is rejected before the catalog is requested. Any
    /// current run is discarded before the catalog is fetched.
    pub async fn run(&mut self) -> ValidatorResult<RunId> {
        let selection = self.selector.selection();
        selection.ensure_not_empty()?;
        self.orchestrator.cancel_run();

        let catalog = match self.features.list_feature_ids().await {
            Ok(catalog) => catalog,
            Err(error) => {
                warn!(%error, "feature catalog failed to load");
                let labels = &self.config.labels;
                self.sink.emit(ValidatorEvent::Toast(format_for_toast(
                    &error,
                    labels.feature_catalog_load_error.clone(),
                    labels,
                )));
                return Err(CatalogError::unavailable(error).into());
            }
        };

        self.orchestrator
            .start_run(catalog, RunContext::new(selection, self.mode.mode()))
    }

    /// Switch display mode, restarting the current run if there is one
    pub fn set_mode(&mut self, mode: DisplayMode) -> ValidatorResult<ModeChange> {
        self.mode.set_mode(mode, &self.orchestrator)
    }

    /// Cancel the current run
    pub fn cancel(&self) -> Option<RunId> {
        self.orchestrator.cancel_run()
    }

    /// Current display mode
    pub fn mode(&self) -> DisplayMode {
        self.mode.mode()
    }

    /// Description of the current mode
    pub fn mode_description(&self) -> &str {
        self.config.labels.mode_description(self.mode.mode())
    }

    /// Current selection
    pub fn selection(&self) -> PrincipalSelection {
        self.selector.selection()
    }

    /// The selector
    pub fn selector(&self) -> &PrincipalSelector {
        &self.selector
    }

    /// The orchestrator
    pub fn orchestrator(&self) -> &ValidationOrchestrator {
        &self.orchestrator
    }

    /// Progress of the current run
    pub fn progress(&self) -> Option<RunProgress> {
        self.orchestrator.progress()
    }

    /// Copy of the current run
    pub fn snapshot(&self) -> Option<RunSnapshot> {
        self.orchestrator.snapshot()
    }

    /// Configuration in use
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Whether selection changes restart the current run
    pub fn watches_selection(&self) -> bool {
        self.watcher.is_some()
    }
}
