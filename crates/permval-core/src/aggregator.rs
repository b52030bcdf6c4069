//! Results Aggregator
//!
//! Converts the raw per-item grants returned for one feature into the model
//! the results card renders. Pure: the output depends only on the inputs.
//!
//! - `overall_status` is `Fail` iff at least one input row has a denied flag,
//!   so an empty input is `Pass`.
//! - Under [`DisplayMode::MissingAccessOnly`] fully granted rows are dropped;
//!   under [`DisplayMode::AllAccess`] every row is kept in input order.
//! - `icon` and `status_label` are a function of `overall_status` alone; the
//!   label text comes from [`StatusLabels`].

use crate::types::{
    AccessRow, DisplayMode, FeatureId, FeatureResultModel, ItemGrantRecord, OverallStatus,
    StatusLabels,
};

/// Build the display model for one feature with the default status labels.
///
/// The backend may already have filtered granted rows for
/// `MissingAccessOnly`; filtering again here is idempotent.
pub fn aggregate(
    feature_id: FeatureId,
    raw_item_results: Vec<ItemGrantRecord>,
    mode: DisplayMode,
) -> FeatureResultModel {
    aggregate_with_labels(feature_id, raw_item_results, mode, &StatusLabels::default())
}

/// Build the display model for one feature, labelling its status from `labels`
pub fn aggregate_with_labels(
    feature_id: FeatureId,
    raw_item_results: Vec<ItemGrantRecord>,
    mode: DisplayMode,
    labels: &StatusLabels,
) -> FeatureResultModel {
    let overall_status = if raw_item_results.iter().any(ItemGrantRecord::has_denied) {
        OverallStatus::Fail
    } else {
        OverallStatus::Pass
    };

    let rows: Vec<AccessRow> = raw_item_results
        .into_iter()
        .filter(|record| mode.show_all() || record.has_denied())
        .map(AccessRow::from)
        .collect();

    tracing::trace!(
        feature = %feature_id,
        %mode,
        status = %overall_status,
        rows = rows.len(),
        "aggregated feature results"
    );

    FeatureResultModel {
        feature_id,
        overall_status,
        icon: overall_status.icon(),
        status_label: labels.label(overall_status).to_string(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessFlag, StatusIcon};

    fn record(api_name: &str, read: bool, create: bool, edit: bool, delete: bool) -> ItemGrantRecord {
        ItemGrantRecord {
            item_id: format!("Apex Class.{api_name}"),
            metadata_type: "Apex Class".to_string(),
            api_name: api_name.to_string(),
            label: api_name.to_string(),
            description: String::new(),
            read: AccessFlag::from_granted(read),
            create: AccessFlag::from_granted(create),
            edit: AccessFlag::from_granted(edit),
            delete: AccessFlag::from_granted(delete),
        }
    }

    #[test]
    fn empty_input_passes_with_no_rows() {
        let model = aggregate(FeatureId::new("A"), vec![], DisplayMode::AllAccess);
        assert_eq!(model.overall_status, OverallStatus::Pass);
        assert_eq!(model.icon, StatusIcon::Success);
        assert!(model.rows.is_empty());
        assert!(!model.show_table());
    }

    #[test]
    fn missing_only_drops_fully_granted_rows() {
        let raw = vec![
            record("Granted", true, true, true, true),
            record("NoDelete", true, true, true, false),
        ];
        let model = aggregate(FeatureId::new("A"), raw, DisplayMode::MissingAccessOnly);
        assert_eq!(model.overall_status, OverallStatus::Fail);
        assert_eq!(model.rows.len(), 1);
        assert_eq!(model.rows[0].api_name, "NoDelete");
        assert_eq!(model.denied_row_count(), 1);
    }

    #[test]
    fn all_access_keeps_every_row_in_order() {
        let raw = vec![
            record("First", true, true, true, true),
            record("Second", false, false, false, false),
            record("Third", true, true, true, true),
        ];
        let model = aggregate(FeatureId::new("A"), raw, DisplayMode::AllAccess);
        let names: Vec<_> = model.rows.iter().map(|r| r.api_name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
        assert_eq!(model.icon, StatusIcon::Error);
    }

    #[test]
    fn status_label_comes_from_labels() {
        let labels = StatusLabels {
            pass: "OK".to_string(),
            fail: "Missing".to_string(),
        };
        let raw = vec![record("NoEdit", true, true, false, true)];
        let model = aggregate_with_labels(FeatureId::new("A"), raw, DisplayMode::AllAccess, &labels);
        assert_eq!(model.status_label, "Missing");

        let model = aggregate_with_labels(FeatureId::new("A"), vec![], DisplayMode::AllAccess, &labels);
        assert_eq!(model.status_label, "OK");
        assert_eq!(
            aggregate(FeatureId::new("A"), vec![], DisplayMode::AllAccess).status_label,
            "You have the required access"
        );
    }

    #[test]
    fn all_granted_under_missing_only_is_pass_without_table() {
        let raw = vec![record("Granted", true, true, true, true)];
        let model = aggregate(FeatureId::new("A"), raw, DisplayMode::MissingAccessOnly);
        assert_eq!(model.overall_status, OverallStatus::Pass);
        assert!(!model.has_missing_access());
        assert!(model.rows.is_empty());
    }
}
