//! Post-construction mungers and validators (§4.8).
//!
//! This crate provides the per-record "derive, then check" step applied
//! after the lazy evaluator has produced a record's fields. It knows nothing
//! about schemas or thunks — `blueprint-engine` drives the post-order
//! traversal over nested records and invokes [`munge_and_validate`] once per
//! record, innermost first.

mod error;
mod munger;
mod plan;
mod validator;

pub use error::{ValidationError, ValidationIssue};
pub use munger::Munger;
pub use plan::{munge_and_validate, FieldPlan, RecordPlan};
pub use validator::{FieldValidator, RecordValidator, ValidatorOutcome};
