//! Permval Testing Infrastructure
//!
//! Test doubles for the validator's collaborators plus fixtures shared by the
//! workspace's integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! permval-testkit = { path = "../permval-testkit" }
//! ```
//!
//! ```rust,ignore
//! use permval_testkit::*;
//!
//! #[tokio::test]
//! async fn feature_passes() {
//!     let checker = ControlledAccessChecker::new();
//!     let (orchestrator, mut events) = orchestrator_with(checker.clone());
//!     orchestrator
//!         .start_run(features(&["A"]), profile_context("P1", DisplayMode::AllAccess))
//!         .unwrap();
//!     checker.wait_for_calls(1).await;
//!     checker.resolve("A", Ok(vec![granted("Apex Class.A")]));
//!     events.until_run_complete().await;
//! }
//! ```

pub mod catalogs;
pub mod checker;
pub mod events;
pub mod fixtures;
pub mod strategies;

pub use catalogs::{StaticFeatureCatalog, StaticPrincipalCatalog};
pub use checker::{AccessCall, ControlledAccessChecker};
pub use events::EventStream;
pub use fixtures::*;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a test-writer tracing subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `debug` for the permval crates.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("permval=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
