//! Formatting backend failures for display
//!
//! A backend error carrying an exception type is an unhandled exception whose
//! message is not meant for users; it is replaced by the configured
//! unexpected-error template with the type interpolated. Otherwise the
//! backend message is shown as is.

use crate::config::Labels;
use crate::notifications::Toast;
use permval_core::AccessCheckError;
use serde::{Deserialize, Serialize};

/// Inline error block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayError {
    /// Title, chosen by the caller
    pub title: String,
    /// Best-effort message
    pub message: String,
}

/// The message a user should see for `error`
pub fn user_message(error: &AccessCheckError, labels: &Labels) -> String {
    match (error.human_message(), error.exception_type.as_deref()) {
        (Some(message), _) => message.to_string(),
        (None, Some(exception_type)) => labels.unexpected_error_for(exception_type),
        (None, None) => labels.unexpected_error_for("unknown"),
    }
}

/// Format an error for inline display
pub fn format_for_display(
    error: &AccessCheckError,
    title: impl Into<String>,
    labels: &Labels,
) -> DisplayError {
    DisplayError {
        title: title.into(),
        message: user_message(error, labels),
    }
}

/// Format an error as an error toast
pub fn format_for_toast(error: &AccessCheckError, title: impl Into<String>, labels: &Labels) -> Toast {
    Toast::error(title, user_message(error, labels))
}
