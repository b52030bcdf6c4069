//! End-to-end session behavior: selection, catalog fetch, re-runs

use assert_matches::assert_matches;
use permval_app::{ModeChange, ValidatorConfig, ValidatorError, ValidatorEvent};
use permval_core::{
    AccessCheckError, CatalogError, DisplayMode, PrincipalId, SelectionAxis, SelectionError,
};
use permval_testkit::*;
use std::collections::BTreeSet;

fn ids(ids: &[&str]) -> BTreeSet<PrincipalId> {
    ids.iter().map(|id| PrincipalId::from(*id)).collect()
}

fn rerun_config() -> ValidatorConfig {
    ValidatorConfig {
        rerun_on_selection_change: true,
        ..ValidatorConfig::default()
    }
}

#[tokio::test]
async fn empty_selection_never_reaches_the_backend() {
    let mut harness =
        SessionHarness::new(ValidatorConfig::default(), StaticFeatureCatalog::new(["A"])).await;
    assert!(!harness.session.can_run());

    let result = harness.session.run().await;
    assert_matches!(result, Err(ValidatorError::Selection(SelectionError::Empty)));
    assert_eq!(harness.catalog.requests(), 0);
    assert_eq!(harness.checker.call_count(), 0);
    assert!(harness.session.snapshot().is_none());
}

#[tokio::test]
async fn run_checks_every_catalog_feature_with_the_selection() {
    let mut harness = SessionHarness::new(
        ValidatorConfig::default(),
        StaticFeatureCatalog::new(["A", "B", "C"]),
    )
    .await;
    harness
        .session
        .select_profile(Some(PrincipalId::from("P1")))
        .unwrap();
    harness
        .session
        .select_permission_sets(ids(&["PS1", "PS2"]))
        .unwrap();
    assert!(harness.session.can_run());

    let run_id = harness.session.run().await.unwrap();
    harness.checker.wait_for_calls(3).await;
    for call in harness.checker.calls() {
        assert_eq!(call.mode, DisplayMode::MissingAccessOnly);
        assert_eq!(call.selection.profile_id, Some(PrincipalId::from("P1")));
        assert_eq!(call.selection.permission_set_ids, ids(&["PS1", "PS2"]));
    }

    for feature in ["C", "A", "B"] {
        harness.checker.resolve(feature, Ok(vec![granted("Custom Field.Amount")]));
    }
    let (completed_run, progress) = harness.events.until_run_complete().await;
    assert_eq!(completed_run, run_id);
    assert_eq!(progress.total, 3);

    let changes = harness
        .events
        .seen()
        .iter()
        .filter(|event| matches!(event, ValidatorEvent::SelectionChanged(_)))
        .count();
    assert_eq!(changes, 2);
}

#[tokio::test]
async fn catalog_failure_is_toasted_and_returned() {
    let mut harness = SessionHarness::new(
        ValidatorConfig::default(),
        StaticFeatureCatalog::failing(AccessCheckError::unexpected(
            "System.QueryException",
            "List has no rows for assignment to SObject",
        )),
    )
    .await;
    harness
        .session
        .select_permission_set_groups(ids(&["PSG1"]))
        .unwrap();

    let result = harness.session.run().await;
    assert_matches!(
        result,
        Err(ValidatorError::Catalog(CatalogError::Unavailable(_)))
    );
    assert_eq!(harness.checker.call_count(), 0);

    harness.events.drain_ready();
    let errors = harness.events.error_toasts();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].title, "Unable to load permission definitions");
    assert_eq!(
        errors[0].message,
        "An unexpected error occurred: System.QueryException"
    );
}

#[tokio::test]
async fn duplicate_catalog_entries_are_rejected() {
    let mut harness = SessionHarness::new(
        ValidatorConfig::default(),
        StaticFeatureCatalog::new(["A", "B", "A"]),
    )
    .await;
    harness
        .session
        .select_profile(Some(PrincipalId::from("P2")))
        .unwrap();

    let result = harness.session.run().await;
    assert_matches!(
        result,
        Err(ValidatorError::Catalog(CatalogError::DuplicateFeature(id))) if id.as_str() == "A"
    );
    assert_eq!(harness.checker.call_count(), 0);
}

#[tokio::test]
async fn failed_principal_axis_is_toasted_and_others_load() {
    let principals = sample_principals().with_failure(
        SelectionAxis::PermissionSet,
        AccessCheckError::handled("Insufficient privileges"),
    );
    let mut harness = SessionHarness::with_principals(
        ValidatorConfig::default(),
        StaticFeatureCatalog::new(["A"]),
        principals,
    )
    .await;

    harness.events.drain_ready();
    let errors = harness.events.error_toasts();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].title, "Unable to load permission sets");
    assert_eq!(errors[0].message, "Insufficient privileges");

    let selector = harness.session.selector();
    assert_eq!(selector.listbox(SelectionAxis::Profile).options().len(), 2);
    assert!(selector
        .listbox(SelectionAxis::PermissionSet)
        .options()
        .is_empty());

    let rejected = harness.session.select_permission_sets(ids(&["PS1"]));
    assert_matches!(rejected, Err(SelectionError::UnknownPrincipal { .. }));
}

#[tokio::test]
async fn explicit_rerun_discards_prior_results() {
    let mut harness =
        SessionHarness::new(ValidatorConfig::default(), StaticFeatureCatalog::new(["A"])).await;
    harness
        .session
        .select_profile(Some(PrincipalId::from("P1")))
        .unwrap();

    let first = harness.session.run().await.unwrap();
    harness.checker.wait_for_calls(1).await;
    harness.checker.resolve("A", Ok(vec![denied("Apex Class.Old")]));
    harness.events.until_run_complete().await;

    let second = harness.session.run().await.unwrap();
    assert!(second > first);
    let snapshot = harness.session.snapshot().unwrap();
    assert_eq!(snapshot.run_id, second);
    assert_eq!(snapshot.progress.completed, 0);
    assert!(snapshot.features[0].result().is_none());
    assert_eq!(harness.catalog.requests(), 2);
}

#[tokio::test]
async fn session_mode_switch_uses_config_default() {
    let config = ValidatorConfig {
        default_mode: DisplayMode::AllAccess,
        ..ValidatorConfig::default()
    };
    let mut harness = SessionHarness::new(config, StaticFeatureCatalog::new(["A"])).await;
    assert_eq!(harness.session.mode(), DisplayMode::AllAccess);
    assert_eq!(
        harness.session.mode_description(),
        "Showing all access for the selected principals."
    );

    assert_eq!(
        harness.session.set_mode(DisplayMode::MissingAccessOnly).unwrap(),
        ModeChange::Recorded
    );
    harness
        .session
        .select_profile(Some(PrincipalId::from("P1")))
        .unwrap();
    harness.session.run().await.unwrap();
    harness.checker.wait_for_calls(1).await;
    assert_eq!(harness.checker.calls()[0].mode, DisplayMode::MissingAccessOnly);
}

#[tokio::test]
async fn selection_change_restarts_when_enabled() {
    init_test_tracing();
    let mut harness = SessionHarness::new(rerun_config(), StaticFeatureCatalog::new(["A", "B"])).await;
    assert!(harness.session.watches_selection());
    harness
        .session
        .select_profile(Some(PrincipalId::from("P1")))
        .unwrap();

    let first = harness.session.run().await.unwrap();
    harness.checker.wait_for_calls(2).await;

    harness
        .session
        .select_profile(Some(PrincipalId::from("P2")))
        .unwrap();
    harness.checker.wait_for_calls(4).await;

    let rerun = &harness.checker.calls()[2..];
    assert!(rerun
        .iter()
        .all(|call| call.selection.profile_id == Some(PrincipalId::from("P2"))));
    let active = harness.session.orchestrator().active_run_id().unwrap();
    assert!(active > first);
    assert_eq!(harness.catalog.requests(), 1);

    harness.session.select_profile(None).unwrap();
    harness.events.settle().await;
    assert!(harness.session.snapshot().is_none());
}

#[tokio::test]
async fn selection_change_is_ignored_when_disabled() {
    let mut harness =
        SessionHarness::new(ValidatorConfig::default(), StaticFeatureCatalog::new(["A"])).await;
    assert!(!harness.session.watches_selection());
    harness
        .session
        .select_profile(Some(PrincipalId::from("P1")))
        .unwrap();
    let run_id = harness.session.run().await.unwrap();
    harness.checker.wait_for_calls(1).await;

    harness
        .session
        .select_profile(Some(PrincipalId::from("P2")))
        .unwrap();
    harness.events.settle().await;
    assert_eq!(harness.checker.call_count(), 1);
    assert_eq!(harness.session.orchestrator().active_run_id(), Some(run_id));
}

#[tokio::test]
async fn explicit_run_survives_earlier_selection_changes() {
    let mut harness = SessionHarness::new(rerun_config(), StaticFeatureCatalog::new(["A"])).await;
    harness
        .session
        .select_profile(Some(PrincipalId::from("P1")))
        .unwrap();
    harness.session.run().await.unwrap();
    harness.checker.wait_for_calls(1).await;
    harness.events.settle().await;

    // clears the selection on the way to a new one
    harness.session.select_profile(None).unwrap();
    harness
        .session
        .select_permission_sets(ids(&["PS1"]))
        .unwrap();
    let second = harness.session.run().await.unwrap();
    harness.events.settle().await;

    assert_eq!(harness.session.orchestrator().active_run_id(), Some(second));
    harness.checker.wait_for_calls(2).await;
    assert_eq!(harness.checker.call_count(), 2);
    let call = &harness.checker.calls()[1];
    assert_eq!(call.selection.profile_id, None);
    assert_eq!(call.selection.permission_set_ids, ids(&["PS1"]));

    harness.checker.resolve("A", Ok(vec![granted("Custom Field.Old")]));
    harness.checker.resolve("A", Ok(vec![granted("Custom Field.Amount")]));
    let (completed_run, progress) = harness.events.until_run_complete().await;
    assert_eq!(completed_run, second);
    assert_eq!((progress.completed, progress.total), (1, 1));
}

#[tokio::test]
async fn queued_selection_changes_restart_once_with_the_latest() {
    let mut harness = SessionHarness::new(rerun_config(), StaticFeatureCatalog::new(["A"])).await;
    harness
        .session
        .select_profile(Some(PrincipalId::from("P1")))
        .unwrap();
    let first = harness.session.run().await.unwrap();
    harness.checker.wait_for_calls(1).await;
    harness.events.settle().await;

    harness
        .session
        .select_profile(Some(PrincipalId::from("P2")))
        .unwrap();
    harness
        .session
        .select_permission_sets(ids(&["PS2"]))
        .unwrap();
    harness.checker.wait_for_calls(2).await;
    harness.events.settle().await;

    assert_eq!(harness.checker.call_count(), 2);
    let call = &harness.checker.calls()[1];
    assert_eq!(call.selection.profile_id, Some(PrincipalId::from("P2")));
    assert_eq!(call.selection.permission_set_ids, ids(&["PS2"]));
    let active = harness.session.orchestrator().active_run_id().unwrap();
    assert!(active > first);
}
