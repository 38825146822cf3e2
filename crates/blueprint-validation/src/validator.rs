//! Validators: field-level and whole-record post-construction checks (§4.8).

use std::sync::Arc;

use blueprint_types::ConcreteValue;

use crate::error::ValidationIssue;

/// The outcome of running a single validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorOutcome {
    Ok,
    Err { message: String },
}

impl ValidatorOutcome {
    pub fn ok() -> Self {
        ValidatorOutcome::Ok
    }

    pub fn err(message: impl Into<String>) -> Self {
        ValidatorOutcome::Err {
            message: message.into(),
        }
    }
}

/// A field-level validator: takes the field's final value.
pub type FieldValidator = Arc<dyn Fn(&ConcreteValue) -> ValidatorOutcome + Send + Sync>;

/// A whole-record validator: takes the fully-built record.
pub type RecordValidator = Arc<dyn Fn(&ConcreteValue) -> ValidatorOutcome + Send + Sync>;

pub(crate) fn into_issue(field: Option<&str>, outcome: ValidatorOutcome) -> Option<ValidationIssue> {
    match outcome {
        ValidatorOutcome::Ok => None,
        ValidatorOutcome::Err { message } => Some(ValidationIssue {
            field: field.map(str::to_string),
            message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_validator_rejects() {
        let positive: FieldValidator = Arc::new(|v| match v {
            ConcreteValue::Float(f) if *f > 0.0 => ValidatorOutcome::ok(),
            _ => ValidatorOutcome::err("must be positive"),
        });
        assert_eq!(positive(&ConcreteValue::Float(-1.0)), ValidatorOutcome::err("must be positive"));
        assert_eq!(positive(&ConcreteValue::Float(1.0)), ValidatorOutcome::ok());
    }

    #[test]
    fn test_into_issue_ok_is_none() {
        assert!(into_issue(Some("rate"), ValidatorOutcome::ok()).is_none());
    }

    #[test]
    fn test_into_issue_err_carries_field() {
        let issue = into_issue(Some("rate"), ValidatorOutcome::err("bad")).unwrap();
        assert_eq!(issue.field.as_deref(), Some("rate"));
        assert_eq!(issue.message, "bad");
    }
}
