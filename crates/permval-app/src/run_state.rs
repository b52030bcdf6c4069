//! Per-feature run state and derived progress
//!
//! Lifecycle of one feature within one run:
//!
//! ```text
//! Pending ──issue──▶ InFlight ──ok──▶ Succeeded
//!                        └─────err──▶ Failed
//! ```
//!
//! Terminal states never transition again within the same run.

use crate::error_format::DisplayError;
use permval_core::{AccessCheckError, DisplayMode, FeatureId, FeatureResultModel, RunId, StatusIcon};
use serde::{Deserialize, Serialize};

/// Status of one feature within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureStatus {
    /// Created, request not yet issued
    Pending,
    /// Request issued, no response yet
    InFlight,
    /// Response received and aggregated
    Succeeded,
    /// The access check failed
    Failed,
}

impl FeatureStatus {
    /// Whether the status is final for the run
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Attempted a transition the lifecycle does not allow
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Feature {feature_id} cannot move from {from:?} to {to:?}")]
pub struct TransitionError {
    /// Feature whose transition was rejected
    pub feature_id: FeatureId,
    /// Current status
    pub from: FeatureStatus,
    /// Requested status
    pub to: FeatureStatus,
}

/// Failure recorded on a feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFailure {
    /// The backend error as received
    pub error: AccessCheckError,
    /// What the user is shown
    pub display: DisplayError,
}

/// State of one feature within the active run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRunState {
    feature_id: FeatureId,
    status: FeatureStatus,
    result: Option<FeatureResultModel>,
    failure: Option<FeatureFailure>,
}

impl FeatureRunState {
    /// Fresh pending state
    pub fn pending(feature_id: FeatureId) -> Self {
        Self {
            feature_id,
            status: FeatureStatus::Pending,
            result: None,
            failure: None,
        }
    }

    /// Feature this state belongs to
    pub fn feature_id(&self) -> &FeatureId {
        &self.feature_id
    }

    /// Current status
    pub fn status(&self) -> FeatureStatus {
        self.status
    }

    /// Result model, once succeeded
    pub fn result(&self) -> Option<&FeatureResultModel> {
        self.result.as_ref()
    }

    /// Failure, once failed
    pub fn failure(&self) -> Option<&FeatureFailure> {
        self.failure.as_ref()
    }

    /// Whether the feature has reported
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Card icon: error when failed, loading until a result exists
    pub fn card_icon(&self) -> StatusIcon {
        match (&self.status, &self.result) {
            (FeatureStatus::Failed, _) => StatusIcon::Error,
            (_, Some(model)) => model.icon,
            _ => StatusIcon::Loading,
        }
    }

    pub(crate) fn mark_in_flight(&mut self) -> Result<(), TransitionError> {
        self.transition(FeatureStatus::InFlight)
    }

    pub(crate) fn succeed(&mut self, model: FeatureResultModel) -> Result<(), TransitionError> {
        self.transition(FeatureStatus::Succeeded)?;
        self.result = Some(model);
        Ok(())
    }

    pub(crate) fn fail(&mut self, failure: FeatureFailure) -> Result<(), TransitionError> {
        self.transition(FeatureStatus::Failed)?;
        self.failure = Some(failure);
        Ok(())
    }

    fn transition(&mut self, to: FeatureStatus) -> Result<(), TransitionError> {
        let allowed = matches!(
            (self.status, to),
            (FeatureStatus::Pending, FeatureStatus::InFlight)
                | (FeatureStatus::InFlight, FeatureStatus::Succeeded)
                | (FeatureStatus::InFlight, FeatureStatus::Failed)
        );
        if !allowed {
            return Err(TransitionError {
                feature_id: self.feature_id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Progress of a run, derived from its feature states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RunProgress {
    /// Number of features in the catalog
    pub total: usize,
    /// Number of features in a terminal status
    pub completed: usize,
}

impl RunProgress {
    /// Derive progress from feature states
    pub fn from_states<'a>(states: impl IntoIterator<Item = &'a FeatureRunState>) -> Self {
        let mut progress = Self::default();
        for state in states {
            progress.total += 1;
            if state.is_terminal() {
                progress.completed += 1;
            }
        }
        progress
    }

    /// Every feature has reported
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    /// Features still pending or in flight
    pub fn outstanding(&self) -> usize {
        self.total.saturating_sub(self.completed)
    }
}

/// Point-in-time copy of the active run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Run identifier
    pub run_id: RunId,
    /// Mode the run executes under
    pub mode: DisplayMode,
    /// Feature states in catalog order
    pub features: Vec<FeatureRunState>,
    /// Derived progress
    pub progress: RunProgress,
}

impl RunSnapshot {
    /// State of one feature
    pub fn feature(&self, feature_id: &FeatureId) -> Option<&FeatureRunState> {
        self.features
            .iter()
            .find(|state| state.feature_id() == feature_id)
    }

    /// Feature ids in display order
    pub fn feature_order(&self) -> Vec<&FeatureId> {
        self.features.iter().map(FeatureRunState::feature_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use permval_core::{aggregate, DisplayMode};

    fn failure() -> FeatureFailure {
        FeatureFailure {
            error: AccessCheckError::handled("boom"),
            display: DisplayError {
                title: "t".to_string(),
                message: "boom".to_string(),
            },
        }
    }

    #[test]
    fn lifecycle_reaches_exactly_one_terminal_state() {
        let mut state = FeatureRunState::pending(FeatureId::new("A"));
        assert_eq!(state.card_icon(), StatusIcon::Loading);
        state.mark_in_flight().unwrap();

        let model = aggregate(FeatureId::new("A"), vec![], DisplayMode::AllAccess);
        state.succeed(model).unwrap();
        assert_eq!(state.status(), FeatureStatus::Succeeded);
        assert_eq!(state.card_icon(), StatusIcon::Success);

        assert!(state.fail(failure()).is_err());
        assert!(state.failure().is_none());
    }

    #[test]
    fn pending_cannot_complete_without_issue() {
        let mut state = FeatureRunState::pending(FeatureId::new("A"));
        let err = state.fail(failure()).unwrap_err();
        assert_eq!(err.from, FeatureStatus::Pending);
        assert_eq!(state.status(), FeatureStatus::Pending);
    }

    #[test]
    fn failed_feature_shows_error_icon() {
        let mut state = FeatureRunState::pending(FeatureId::new("A"));
        state.mark_in_flight().unwrap();
        state.fail(failure()).unwrap();
        assert_eq!(state.card_icon(), StatusIcon::Error);
    }

    #[test]
    fn progress_counts_terminal_states() {
        let mut a = FeatureRunState::pending(FeatureId::new("A"));
        let b = FeatureRunState::pending(FeatureId::new("B"));
        a.mark_in_flight().unwrap();
        a.fail(failure()).unwrap();

        let progress = RunProgress::from_states([&a, &b]);
        assert_eq!(progress, RunProgress { total: 2, completed: 1 });
        assert!(!progress.is_complete());
        assert_eq!(progress.outstanding(), 1);
        assert!(RunProgress::default().is_complete());
    }
}
