//! Core data model shared across the Blueprint configuration engine.
//!
//! This crate defines the primitives every other crate in the workspace
//! builds on: dotted [`Path`]s, the [`ArgValue`]/[`ConcreteValue`] value
//! forms, [`Layer`]s of argument entries, and the [`Type`] algebra. It has a
//! small, deliberately low dependency surface — the casting, walking and
//! evaluation logic that interprets these types lives in `blueprint-engine`.
//!
//! # Types
//!
//! - [`Path`] — a dot-separated parameter address
//! - [`ArgValue`] / [`ConcreteValue`] — pre- and post-cast value forms
//! - [`Layer`] — a named, atomically-applied batch of argument entries
//! - [`Type`] — the closed type algebra (§4.6)

mod layer;
mod path;
mod ty;
mod value;

pub use layer::{Layer, WildcardEntry};
pub use path::{Path, PathError};
pub use ty::{LiteralValue, MapSchemaKey, Type};
pub use value::{ArgValue, ComputeError, ComputeFn, Computed, ConcreteValue};
