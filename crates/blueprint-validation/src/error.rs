//! Validation error aggregation.

use std::fmt;

/// A single validator rejection: a field-level or whole-record message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// The field this issue is attached to, or `None` for a whole-record
    /// validator.
    pub field: Option<String>,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// All validators are run independently; their rejections are collected into
/// a single composite error rather than failing fast on the first one.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("validation failed with {} issue(s): {}", issues.len(), format_issues(issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        ValidationError { issues }
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ValidationIssue::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
