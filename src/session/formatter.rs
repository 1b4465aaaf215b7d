use super::{SessionStatus, SessionView};
use crate::error::display_path;
use itertools::Itertools;
use serde_json::Value;

/// Formats session views into human-readable text.
pub struct ViewFormatter;

impl ViewFormatter {
    /// Render a view as a short multi-line summary of the current step.
    pub fn format_view(view: &SessionView) -> String {
        let mut lines = vec![
            format!("Session {} ({}, v{})", view.id, view.status, view.version),
            format!("Path: {}", display_path(&view.path)),
        ];
        if !view.label.is_empty() {
            lines.push(format!("Step: {}", view.label));
        }

        match &view.profile {
            Some(profile) => lines.push(format!("Profile: {}", profile)),
            None => lines.push("Profile: (none resolved)".to_string()),
        }

        if !view.options.is_empty() {
            lines.push(format!("Options: {}", view.options.join(", ")));
        }
        if !view.specializations.is_empty() {
            lines.push(format!("Specializations: {}", view.specializations.join(", ")));
        }

        if !view.inputs.is_empty() {
            lines.push("Inputs:".to_string());
            for (key, value) in view.inputs.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
                lines.push(format!("  {} = {}", key, Self::format_value(value)));
            }
        }

        if view.status == SessionStatus::Submitted {
            lines.push("Submitted.".to_string());
        } else if view.complete {
            lines.push("Ready to submit.".to_string());
        } else if !view.missing.is_empty() {
            lines.push(format!("Missing: {}", view.missing.join(", ")));
        }

        if !view.optional_inputs.is_empty() {
            lines.push(format!("Optional: {}", view.optional_inputs.join(", ")));
        }

        lines.join("\n")
    }

    /// Format an input value for display.
    fn format_value(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => "null".to_string(),
            other => other.to_string(),
        }
    }
}
