//! Property tests for result aggregation

use permval_core::{
    aggregate, AccessFlag, DisplayMode, FeatureId, ItemGrantRecord, OverallStatus, StatusIcon,
    StatusLabels,
};
use proptest::prelude::*;

fn flag() -> impl Strategy<Value = AccessFlag> {
    prop_oneof![Just(AccessFlag::Granted), Just(AccessFlag::Denied)]
}

fn record() -> impl Strategy<Value = ItemGrantRecord> {
    ("[a-z]{1,12}", flag(), flag(), flag(), flag()).prop_map(
        |(name, read, create, edit, delete)| ItemGrantRecord {
            item_id: format!("Custom Object.{name}"),
            metadata_type: "Custom Object".to_string(),
            api_name: name.clone(),
            label: name,
            description: String::new(),
            read,
            create,
            edit,
            delete,
        },
    )
}

proptest! {
    #[test]
    fn missing_only_never_returns_fully_granted_rows(
        records in prop::collection::vec(record(), 0..20)
    ) {
        let model = aggregate(FeatureId::new("F"), records, DisplayMode::MissingAccessOnly);
        for row in &model.rows {
            prop_assert!(row.flags().iter().any(|flag| !flag.is_granted()));
        }
    }

    #[test]
    fn all_access_returns_every_row_unfiltered(
        records in prop::collection::vec(record(), 0..20)
    ) {
        let expected: Vec<String> = records.iter().map(|r| r.item_id.clone()).collect();
        let model = aggregate(FeatureId::new("F"), records, DisplayMode::AllAccess);
        let actual: Vec<String> = model.rows.iter().map(|r| r.item_id.clone()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn status_is_fail_iff_some_flag_denied(
        records in prop::collection::vec(record(), 0..20),
        show_all in any::<bool>(),
    ) {
        let any_denied = records.iter().any(ItemGrantRecord::has_denied);
        let mode = if show_all { DisplayMode::AllAccess } else { DisplayMode::MissingAccessOnly };
        let model = aggregate(FeatureId::new("F"), records, mode);

        let expected = if any_denied { OverallStatus::Fail } else { OverallStatus::Pass };
        prop_assert_eq!(model.overall_status, expected);
        prop_assert_eq!(model.icon, expected.icon());
        let labels = StatusLabels::default();
        prop_assert_eq!(model.status_label.as_str(), labels.label(expected));
    }

    #[test]
    fn status_is_identical_across_modes(records in prop::collection::vec(record(), 0..20)) {
        let all = aggregate(FeatureId::new("F"), records.clone(), DisplayMode::AllAccess);
        let missing = aggregate(FeatureId::new("F"), records, DisplayMode::MissingAccessOnly);
        prop_assert_eq!(all.overall_status, missing.overall_status);
    }
}

#[test]
fn icon_pairs_are_stable() {
    assert_eq!(OverallStatus::Pass.icon(), StatusIcon::Success);
    assert_eq!(OverallStatus::Fail.icon(), StatusIcon::Error);
    assert_eq!(StatusIcon::Success.as_str(), "utility:success");
    assert_eq!(StatusIcon::Error.as_str(), "utility:error");
}
