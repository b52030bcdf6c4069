//! Permval App - Permission Validation Engine
//!
//! Runs a permission validation pass: for a chosen principal selection and
//! display mode, one access check per feature is issued concurrently, each
//! result is aggregated into a display model as it arrives, and a single
//! run-complete signal is raised once every feature has reported.
//!
//! # Components
//!
//! - [`selector::PrincipalSelector`]: profile / permission set / permission
//!   set group selection
//! - [`orchestrator::ValidationOrchestrator`]: fan-out, per-feature state,
//!   run tokens
//! - [`completion::CompletionTracker`]: exactly-once run completion
//! - [`mode::ModeController`]: display mode; a change re-executes the run
//! - [`session::ValidatorSession`]: wires the above to the backend
//!   collaborators and the notification sink
//!
//! # Usage
//!
//! ```rust,ignore
//! let (sink, mut events) = ChannelSink::new();
//! let mut session = ValidatorSession::new(config, services, Arc::new(sink))?;
//! session.load_principals().await;
//! session.select_profile(Some("00e000000000001".into()))?;
//! let run_id = session.run().await?;
//!
//! while let Some(event) = events.recv().await {
//!     if let ValidatorEvent::RunComplete { .. } = event {
//!         break;
//!     }
//! }
//! ```

#![forbid(unsafe_code)]

pub mod completion;
pub mod config;
pub mod error_format;
pub mod errors;
pub mod mode;
pub mod notifications;
pub mod orchestrator;
pub mod run_state;
pub mod selector;
pub mod session;

pub use completion::{CompletionTracker, RunCompleted};
pub use config::{ConfigError, Labels, ValidatorConfig};
pub use error_format::{format_for_display, format_for_toast, DisplayError};
pub use errors::{ValidatorError, ValidatorResult};
pub use mode::{ModeChange, ModeController};
pub use notifications::{ChannelSink, NullSink, Toast, ToastLevel, ValidatorEvent, ValidatorSink};
pub use orchestrator::{RunContext, ValidationOrchestrator};
pub use run_state::{FeatureFailure, FeatureRunState, FeatureStatus, RunProgress, RunSnapshot};
pub use selector::{DualListbox, LoadReport, PrincipalSelector, SelectionChanged};
pub use session::{SelectionWatcher, ValidatorServices, ValidatorSession};

// Re-export the domain crate for downstream convenience
pub use permval_core;
