//! # Validation Orchestrator
//!
//! Fans one access check per feature out onto the Tokio runtime, records each
//! feature's outcome as it resolves, and reports progress and completion.
//!
//! ## Run tokens
//!
//! Every run gets a fresh, strictly increasing [`RunId`]. Each spawned request
//! carries the id of the run that issued it, and its response is applied only
//! if that id is still the active run. Cancelling aborts the outstanding
//! tasks, but an abort can lose the race with a response that has already
//! resolved, so the id check is what keeps late responses from touching a
//! newer run.
//!
//! ## State ownership
//!
//! The feature states of the active run live behind one mutex owned by the
//! orchestrator. Responses apply their update and emit the resulting events
//! while holding it, so updates are serialized and events of one run reach
//! the sink in mutation order.

use crate::completion::CompletionTracker;
use crate::config::Labels;
use crate::error_format::format_for_display;
use crate::errors::{ValidatorError, ValidatorResult};
use crate::notifications::{Toast, ValidatorEvent, ValidatorSink};
use crate::run_state::{FeatureFailure, FeatureRunState, RunProgress, RunSnapshot};
use indexmap::IndexMap;
use parking_lot::Mutex;
use permval_core::{
    aggregate_with_labels, AccessCheckError, AccessChecker, CatalogError, DisplayMode, FeatureId,
    ItemGrantRecord, PrincipalSelection, RunId,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Inputs a run is fully determined by, besides the feature catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Principals the features are checked against
    pub selection: PrincipalSelection,
    /// Which rows the result models carry
    pub mode: DisplayMode,
}

impl RunContext {
    /// Create a run context
    pub fn new(selection: PrincipalSelection, mode: DisplayMode) -> Self {
        Self { selection, mode }
    }
}

struct ActiveRun {
    run_id: RunId,
    context: RunContext,
    features: IndexMap<FeatureId, FeatureRunState>,
    tasks: Vec<JoinHandle<()>>,
}

impl ActiveRun {
    fn progress(&self) -> RunProgress {
        RunProgress::from_states(self.features.values())
    }

    fn abort_outstanding(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

struct OrchestratorState {
    last_run_id: RunId,
    active: Option<ActiveRun>,
    tracker: CompletionTracker,
}

struct Shared {
    state: Mutex<OrchestratorState>,
    sink: Arc<dyn ValidatorSink>,
    labels: Labels,
}

/// Runs validation passes over a feature catalog
///
/// Cheap to clone; clones share the same active run.
#[derive(Clone)]
pub struct ValidationOrchestrator {
    checker: Arc<dyn AccessChecker>,
    shared: Arc<Shared>,
}

impl ValidationOrchestrator {
    /// Create an orchestrator reporting to `sink`
    pub fn new(checker: Arc<dyn AccessChecker>, sink: Arc<dyn ValidatorSink>, labels: Labels) -> Self {
        Self {
            checker,
            shared: Arc::new(Shared {
                state: Mutex::new(OrchestratorState {
                    last_run_id: RunId::INITIAL,
                    active: None,
                    tracker: CompletionTracker::new(),
                }),
                sink,
                labels,
            }),
        }
    }

    /// Start a new run, superseding any current one.
    ///
    /// Rejects an empty selection and a catalog with duplicate features
    /// before anything is cancelled or issued. An empty catalog yields a run
    /// that is immediately complete at zero progress; its `RunComplete` is
    /// emitted right after the initial `Progress`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_run(&self, catalog: Vec<FeatureId>, context: RunContext) -> ValidatorResult<RunId> {
        context.selection.ensure_not_empty()?;
        ensure_unique(&catalog)?;
        let runtime = Handle::try_current().map_err(|_| ValidatorError::NoRuntime)?;

        let mut state = self.shared.state.lock();
        Ok(self.start_locked(&mut state, &runtime, catalog, context))
    }

    /// Restart the current run's catalog under a new context.
    ///
    /// Returns `Ok(None)` when there is no current run to restart.
    pub fn restart_with(&self, context: RunContext) -> ValidatorResult<Option<RunId>> {
        context.selection.ensure_not_empty()?;
        let runtime = Handle::try_current().map_err(|_| ValidatorError::NoRuntime)?;

        let mut state = self.shared.state.lock();
        let catalog: Vec<FeatureId> = match &state.active {
            Some(run) => run.features.keys().cloned().collect(),
            None => return Ok(None),
        };
        Ok(Some(self.start_locked(&mut state, &runtime, catalog, context)))
    }

    /// Supersede the current run.
    ///
    /// Outstanding requests are aborted where possible; any response that
    /// still arrives is discarded. Returns the cancelled run, if any.
    pub fn cancel_run(&self) -> Option<RunId> {
        let mut state = self.shared.state.lock();
        let run = state.active.take()?;
        state.tracker.disarm();
        run.abort_outstanding();
        info!(run_id = %run.run_id, outstanding = run.progress().outstanding(), "validation run cancelled");
        Some(run.run_id)
    }

    /// Identifier of the current run
    pub fn active_run_id(&self) -> Option<RunId> {
        self.shared.state.lock().active.as_ref().map(|run| run.run_id)
    }

    /// Context of the current run
    pub fn active_context(&self) -> Option<RunContext> {
        self.shared
            .state
            .lock()
            .active
            .as_ref()
            .map(|run| run.context.clone())
    }

    /// Progress of the current run
    pub fn progress(&self) -> Option<RunProgress> {
        self.shared.state.lock().active.as_ref().map(ActiveRun::progress)
    }

    /// State of one feature in the current run
    pub fn feature_state(&self, feature_id: &FeatureId) -> Option<FeatureRunState> {
        self.shared
            .state
            .lock()
            .active
            .as_ref()
            .and_then(|run| run.features.get(feature_id).cloned())
    }

    /// Copy of the current run, features in catalog order
    pub fn snapshot(&self) -> Option<RunSnapshot> {
        let state = self.shared.state.lock();
        let run = state.active.as_ref()?;
        Some(RunSnapshot {
            run_id: run.run_id,
            mode: run.context.mode,
            features: run.features.values().cloned().collect(),
            progress: run.progress(),
        })
    }

    fn start_locked(
        &self,
        state: &mut OrchestratorState,
        runtime: &Handle,
        catalog: Vec<FeatureId>,
        context: RunContext,
    ) -> RunId {
        if let Some(previous) = state.active.take() {
            previous.abort_outstanding();
            debug!(run_id = %previous.run_id, "superseding validation run");
        }

        let run_id = state.last_run_id.next();
        state.last_run_id = run_id;
        let completed_on_start = state.tracker.reset(run_id, catalog.len());

        let mut features: IndexMap<FeatureId, FeatureRunState> = catalog
            .into_iter()
            .map(|feature_id| (feature_id.clone(), FeatureRunState::pending(feature_id)))
            .collect();

        info!(
            %run_id,
            features = features.len(),
            mode = %context.mode,
            principals = context.selection.principal_count(),
            "starting validation run"
        );

        let mut tasks = Vec::with_capacity(features.len());
        for (feature_id, feature_state) in &mut features {
            if let Err(error) = feature_state.mark_in_flight() {
                warn!(%run_id, %error, "feature could not be issued");
                continue;
            }

            let checker = Arc::clone(&self.checker);
            let shared = Arc::clone(&self.shared);
            let feature_id = feature_id.clone();
            let selection = context.selection.clone();
            let mode = context.mode;
            tasks.push(runtime.spawn(async move {
                let outcome = checker
                    .check_feature_access(&feature_id, mode, &selection)
                    .await;
                shared.apply(run_id, feature_id, outcome);
            }));
        }

        let run = ActiveRun {
            run_id,
            context,
            features,
            tasks,
        };
        let progress = run.progress();
        state.active = Some(run);
        self.shared
            .sink
            .emit(ValidatorEvent::Progress { run_id, progress });
        if completed_on_start.is_some() {
            info!(%run_id, "validation run complete with an empty catalog");
            self.shared
                .sink
                .emit(ValidatorEvent::RunComplete { run_id, progress });
        }
        run_id
    }
}

impl Shared {
    /// Apply one resolved access check.
    fn apply(
        &self,
        run_id: RunId,
        feature_id: FeatureId,
        outcome: Result<Vec<ItemGrantRecord>, AccessCheckError>,
    ) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(run) = state.active.as_mut().filter(|run| run.run_id == run_id) else {
            debug!(%run_id, feature = %feature_id, "discarding response for superseded run");
            return;
        };
        let mode = run.context.mode;
        let Some(feature_state) = run.features.get_mut(&feature_id) else {
            warn!(%run_id, feature = %feature_id, "response for feature outside the catalog");
            return;
        };

        let (transition, toast) = match outcome {
            Ok(raw) => {
                let model = aggregate_with_labels(feature_id.clone(), raw, mode, &self.labels.status);
                debug!(%run_id, feature = %feature_id, status = %model.overall_status, "feature validated");
                (feature_state.succeed(model), None)
            }
            Err(error) => {
                warn!(%run_id, feature = %feature_id, %error, "feature access check failed");
                let title = format!("{}: {}", self.labels.feature_results_load_error, feature_id);
                let display = format_for_display(&error, title, &self.labels);
                let toast = Toast::error(display.title.clone(), display.message.clone());
                (feature_state.fail(FeatureFailure { error, display }), Some(toast))
            }
        };
        if let Err(error) = transition {
            warn!(%run_id, %error, "ignoring duplicate response");
            return;
        }

        let updated = feature_state.clone();
        let progress = run.progress();

        if let Some(toast) = toast {
            self.sink.emit(ValidatorEvent::Toast(toast));
        }
        self.sink.emit(ValidatorEvent::FeatureResult {
            run_id,
            feature_id: feature_id.clone(),
            state: updated,
        });
        self.sink.emit(ValidatorEvent::Progress { run_id, progress });

        if let Some(completed) = state.tracker.on_feature_terminal(run_id, &feature_id) {
            info!(run_id = %completed.run_id, features = completed.total, "validation run complete");
            self.sink.emit(ValidatorEvent::RunComplete { run_id, progress });
            self.sink.emit(ValidatorEvent::Toast(Toast::success(
                self.labels.run_complete_title.clone(),
                self.labels.run_complete_description.clone(),
            )));
        }
    }
}

fn ensure_unique(catalog: &[FeatureId]) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(catalog.len());
    for feature_id in catalog {
        if !seen.insert(feature_id) {
            return Err(CatalogError::DuplicateFeature(feature_id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NullSink;
    use async_trait::async_trait;

    struct AlwaysGranted;

    #[async_trait]
    impl AccessChecker for AlwaysGranted {
        async fn check_feature_access(
            &self,
            _feature_id: &FeatureId,
            _mode: DisplayMode,
            _selection: &PrincipalSelection,
        ) -> Result<Vec<ItemGrantRecord>, AccessCheckError> {
            Ok(Vec::new())
        }
    }

    fn orchestrator() -> ValidationOrchestrator {
        ValidationOrchestrator::new(Arc::new(AlwaysGranted), Arc::new(NullSink), Labels::default())
    }

    fn context() -> RunContext {
        RunContext::new(PrincipalSelection::with_profile("P1"), DisplayMode::AllAccess)
    }

    #[test]
    fn duplicate_features_are_rejected() {
        let catalog = vec![FeatureId::new("A"), FeatureId::new("A")];
        assert_eq!(
            ensure_unique(&catalog),
            Err(CatalogError::DuplicateFeature(FeatureId::new("A")))
        );
    }

    #[test]
    fn start_outside_runtime_is_rejected() {
        let result = orchestrator().start_run(vec![FeatureId::new("A")], context());
        assert!(matches!(result, Err(ValidatorError::NoRuntime)));
    }

    #[tokio::test]
    async fn empty_selection_is_rejected_before_issue() {
        let orchestrator = orchestrator();
        let result = orchestrator.start_run(
            vec![FeatureId::new("A")],
            RunContext::new(PrincipalSelection::new(), DisplayMode::AllAccess),
        );
        assert!(matches!(result, Err(ValidatorError::Selection(_))));
        assert!(orchestrator.active_run_id().is_none());
    }

    #[tokio::test]
    async fn empty_catalog_is_immediately_complete() {
        let orchestrator = orchestrator();
        orchestrator.start_run(Vec::new(), context()).unwrap();
        let progress = orchestrator.progress().unwrap();
        assert_eq!(progress.total, 0);
        assert!(progress.is_complete());
    }

    #[tokio::test]
    async fn run_ids_increase_across_runs() {
        let orchestrator = orchestrator();
        let first = orchestrator.start_run(vec![FeatureId::new("A")], context()).unwrap();
        let second = orchestrator.start_run(vec![FeatureId::new("A")], context()).unwrap();
        assert!(second > first);
        assert_eq!(orchestrator.cancel_run(), Some(second));
        assert_eq!(orchestrator.cancel_run(), None);
    }

    #[tokio::test]
    async fn responses_for_superseded_runs_are_discarded() {
        let orchestrator = orchestrator();
        let first = orchestrator.start_run(vec![FeatureId::new("A")], context()).unwrap();
        let second = orchestrator.start_run(vec![FeatureId::new("A")], context()).unwrap();

        orchestrator
            .shared
            .apply(first, FeatureId::new("A"), Ok(Vec::new()));
        let state = orchestrator.feature_state(&FeatureId::new("A")).unwrap();
        assert!(!state.is_terminal());

        orchestrator
            .shared
            .apply(second, FeatureId::new("A"), Ok(Vec::new()));
        orchestrator
            .shared
            .apply(second, FeatureId::new("A"), Err(AccessCheckError::handled("late")));
        let state = orchestrator.feature_state(&FeatureId::new("A")).unwrap();
        assert!(state.result().is_some());
        assert!(state.failure().is_none());
        assert!(orchestrator.progress().unwrap().is_complete());
    }

    #[tokio::test]
    async fn restart_without_run_is_noop() {
        let orchestrator = orchestrator();
        assert_eq!(orchestrator.restart_with(context()).unwrap(), None);
    }
}
