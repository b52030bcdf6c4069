//! Mode Controller
//!
//! Owns the display mode. Changing it throws away the current run and
//! re-executes it from scratch under the new mode. Cached raw results are not
//! re-filtered: a missing-access-only response may already have been filtered
//! by the backend, so the all-access rows cannot be derived from it.

use crate::errors::ValidatorResult;
use crate::orchestrator::{RunContext, ValidationOrchestrator};
use permval_core::{DisplayMode, RunId};

/// What a mode change did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    /// The requested mode was already current
    Unchanged,
    /// The mode was recorded; there was no run to restart
    Recorded,
    /// The current run was cancelled and restarted as the given run
    Restarted(RunId),
}

/// Holds the display mode for a session
#[derive(Debug, Clone)]
pub struct ModeController {
    mode: DisplayMode,
}

impl ModeController {
    /// Start in `mode`
    pub fn new(mode: DisplayMode) -> Self {
        Self { mode }
    }

    /// Current mode
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Switch modes.
    ///
    /// The selection and catalog of the current run are kept; only the mode
    /// changes. Nothing is restarted when there is no current run. If the
    /// restart fails the mode is left as it was.
    pub fn set_mode(
        &mut self,
        new_mode: DisplayMode,
        orchestrator: &ValidationOrchestrator,
    ) -> ValidatorResult<ModeChange> {
        if new_mode == self.mode {
            return Ok(ModeChange::Unchanged);
        }

        let change = match orchestrator.active_context() {
            Some(current) => {
                let context = RunContext::new(current.selection, new_mode);
                match orchestrator.restart_with(context)? {
                    Some(run_id) => ModeChange::Restarted(run_id),
                    None => ModeChange::Recorded,
                }
            }
            None => ModeChange::Recorded,
        };

        tracing::info!(from = %self.mode, to = %new_mode, "display mode changed");
        self.mode = new_mode;
        Ok(change)
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(DisplayMode::default())
    }
}
