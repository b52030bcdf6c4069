//! Plain-text rendering of a finished run

use permval_app::{FeatureStatus, RunSnapshot, Toast};
use permval_core::{AccessFlag, AccessRow};
use std::fmt::Write;

fn flag(flag: AccessFlag) -> char {
    if flag.is_granted() {
        '✓'
    } else {
        '✗'
    }
}

fn render_row(out: &mut String, row: &AccessRow) {
    let _ = writeln!(
        out,
        "    [{}] {:<40} R{} C{} E{} D{}  {}",
        row.status(),
        row.item_id,
        flag(row.read),
        flag(row.create),
        flag(row.edit),
        flag(row.delete),
        row.description,
    );
}

/// Render every feature of a run, in catalog order, followed by the progress line
pub fn render_snapshot(snapshot: &RunSnapshot, mode_description: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", mode_description, snapshot.run_id);

    for feature in &snapshot.features {
        let _ = write!(out, "\n{} {}", feature.card_icon(), feature.feature_id());
        match (feature.status(), feature.result(), feature.failure()) {
            (FeatureStatus::Succeeded, Some(model), _) => {
                let _ = writeln!(out, ": {}", model.status_label);
                for row in &model.rows {
                    render_row(&mut out, row);
                }
            }
            (FeatureStatus::Failed, _, Some(failure)) => {
                let _ = writeln!(out, ": {}", failure.display.title);
                let _ = writeln!(out, "    {}", failure.display.message);
            }
            (status, _, _) => {
                let _ = writeln!(out, ": {status:?}");
            }
        }
    }

    let _ = writeln!(
        out,
        "\n{}/{} features validated",
        snapshot.progress.completed, snapshot.progress.total
    );
    out
}

/// One-line toast
pub fn render_toast(toast: &Toast) -> String {
    format!("[{}] {}: {}", toast.level, toast.title, toast.message)
}
