//! Orchestrates mungers then validators for a single record node.
//!
//! Nested records are themselves munged and validated first by the caller
//! (the schema walker in `blueprint-engine`, which owns the recursive
//! structure); this module only implements the per-node step, grounded on
//! `automapper-validation::validator::validate`'s top-level
//! "run every check, collect every failure" orchestration.

use blueprint_types::ConcreteValue;

use crate::error::{ValidationError, ValidationIssue};
use crate::munger::Munger;
use crate::validator::{into_issue, FieldValidator, RecordValidator};

/// The munge/validate plan for one record's fields, in declaration order.
#[derive(Clone)]
pub struct FieldPlan {
    pub name: String,
    pub mungers: Vec<Munger>,
    pub validators: Vec<FieldValidator>,
}

impl FieldPlan {
    pub fn new(name: impl Into<String>) -> Self {
        FieldPlan {
            name: name.into(),
            mungers: Vec::new(),
            validators: Vec::new(),
        }
    }
}

/// The full munge/validate plan for a record node.
#[derive(Clone, Default)]
pub struct RecordPlan {
    pub fields: Vec<FieldPlan>,
    pub record_validators: Vec<RecordValidator>,
}

/// Applies this record's field mungers (in declaration order, each seeing
/// the partially-built record so far), then all field validators, then all
/// whole-record validators. All validators run regardless of earlier
/// failures; every rejection is collected into one [`ValidationError`].
#[tracing::instrument(level = "debug", skip_all)]
pub fn munge_and_validate(
    record: ConcreteValue,
    plan: &RecordPlan,
) -> Result<ConcreteValue, ValidationError> {
    let ConcreteValue::Record(mut fields) = record else {
        panic!("munge_and_validate requires a ConcreteValue::Record");
    };

    // Mungers: sequential, in declaration order, each sees the record as
    // munged so far.
    for field_plan in &plan.fields {
        if field_plan.mungers.is_empty() {
            continue;
        }
        let Some(idx) = fields.iter().position(|(n, _)| n == &field_plan.name) else {
            continue;
        };
        let mut current = fields[idx].1.clone();
        for munger in &field_plan.mungers {
            let snapshot = ConcreteValue::Record(fields.clone());
            current = munger(&current, &snapshot);
        }
        fields[idx].1 = current;
    }

    let record = ConcreteValue::Record(fields);

    // Validators: every one runs; failures are aggregated, never short-circuited.
    let mut issues: Vec<ValidationIssue> = Vec::new();
    for field_plan in &plan.fields {
        let Some(value) = record.field(&field_plan.name) else {
            continue;
        };
        for validator in &field_plan.validators {
            if let Some(issue) = into_issue(Some(&field_plan.name), validator(value)) {
                issues.push(issue);
            }
        }
    }
    for validator in &plan.record_validators {
        if let Some(issue) = into_issue(None, validator(&record)) {
            issues.push(issue);
        }
    }

    if issues.is_empty() {
        Ok(record)
    } else {
        tracing::debug!(issue_count = issues.len(), "validation rejected record");
        Err(ValidationError::new(issues))
    }
}
