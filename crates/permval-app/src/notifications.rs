//! UI notification sink
//!
//! Everything the validator tells a frontend goes through [`ValidatorSink`]:
//! transient toasts, progress after every terminal transition, each feature's
//! latest state, and the single run-complete signal per run.
//!
//! Sinks are called while the orchestrator holds its state lock, so events of
//! one run arrive in the order the state changed. Implementations must not
//! block and must not call back into the orchestrator.

use crate::run_state::{FeatureRunState, RunProgress};
use crate::selector::SelectionChanged;
use permval_core::{FeatureId, RunId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

/// Severity of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    /// Informational
    Info,
    /// Something finished successfully
    Success,
    /// Needs attention
    Warning,
    /// Something failed
    Error,
}

impl ToastLevel {
    /// Variant name used by the rendering layer
    pub fn variant(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ToastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variant())
    }
}

/// A transient, dismissible notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Title
    pub title: String,
    /// Body
    pub message: String,
    /// Severity
    pub level: ToastLevel,
}

impl Toast {
    /// Create a toast
    pub fn new(title: impl Into<String>, message: impl Into<String>, level: ToastLevel) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level,
        }
    }

    /// Create an error toast
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, ToastLevel::Error)
    }

    /// Create a success toast
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, ToastLevel::Success)
    }
}

/// Event emitted to the frontend
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorEvent {
    /// Show a transient notification
    Toast(Toast),
    /// Progress of the run changed
    Progress {
        /// Run the progress belongs to
        run_id: RunId,
        /// New progress
        progress: RunProgress,
    },
    /// A feature reached a terminal state
    FeatureResult {
        /// Run the result belongs to
        run_id: RunId,
        /// Feature that reported
        feature_id: FeatureId,
        /// Its state after the transition
        state: FeatureRunState,
    },
    /// Every feature of the run has reported; emitted once per run, and
    /// immediately for a run over an empty catalog
    RunComplete {
        /// Run that completed
        run_id: RunId,
        /// Final progress
        progress: RunProgress,
    },
    /// The principal selection changed
    SelectionChanged(SelectionChanged),
}

/// Receives validator events
pub trait ValidatorSink: Send + Sync {
    /// Deliver one event; must not block
    fn emit(&self, event: ValidatorEvent);
}

/// Sink that forwards events into an unbounded Tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<ValidatorEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ValidatorEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ValidatorSink for ChannelSink {
    fn emit(&self, event: ValidatorEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("validator event dropped, receiver closed");
        }
    }
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ValidatorSink for NullSink {
    fn emit(&self, _event: ValidatorEvent) {}
}
