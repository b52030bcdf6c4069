//! Completion Tracker
//!
//! Counts features that reached a terminal outcome in the active run and
//! raises the run-complete signal once, when the count reaches the catalog
//! size. The orchestrator calls [`CompletionTracker::on_feature_terminal`]
//! exactly once per feature per run; the tracker does not deduplicate.

use permval_core::{FeatureId, RunId};

/// Signal raised when every feature of a run has reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCompleted {
    /// The run that completed
    pub run_id: RunId,
    /// Number of features that reported
    pub total: usize,
}

/// Per-run terminal outcome counter
#[derive(Debug, Clone)]
pub struct CompletionTracker {
    run_id: RunId,
    expected: usize,
    count: usize,
    armed: bool,
}

impl CompletionTracker {
    /// Tracker with no run
    pub fn new() -> Self {
        Self {
            run_id: RunId::INITIAL,
            expected: 0,
            count: 0,
            armed: false,
        }
    }

    /// Start tracking a run of `expected` features.
    ///
    /// A run with no features is complete as soon as it starts: its signal
    /// is returned here and the tracker stays disarmed.
    pub fn reset(&mut self, run_id: RunId, expected: usize) -> Option<RunCompleted> {
        self.run_id = run_id;
        self.expected = expected;
        self.count = 0;
        self.armed = expected > 0;
        (expected == 0).then_some(RunCompleted { run_id, total: 0 })
    }

    /// Stop tracking; later notifications are ignored
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Run currently tracked
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Terminal outcomes counted so far
    pub fn count(&self) -> usize {
        self.count
    }

    /// Record a terminal outcome.
    ///
    /// Returns the run-complete signal on the notification that makes the
    /// count equal the expected total, and never again for that run.
    /// Notifications for any other run are ignored.
    pub fn on_feature_terminal(&mut self, run_id: RunId, feature_id: &FeatureId) -> Option<RunCompleted> {
        if !self.armed || run_id != self.run_id {
            tracing::trace!(%run_id, feature = %feature_id, "terminal outcome ignored by tracker");
            return None;
        }

        self.count += 1;
        if self.count < self.expected {
            return None;
        }

        self.armed = false;
        Some(RunCompleted {
            run_id: self.run_id,
            total: self.expected,
        })
    }
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}
