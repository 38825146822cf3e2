//! The Blueprint construction engine (§4.3-§4.8): the argument map, schema
//! walker, lazy evaluator, type caster and meta-factory registry that turn a
//! schema plus a layered argument space into a constructed value.
//!
//! Token parsing and wildcard compilation live in `blueprint-parser`;
//! post-construction mungers and validators live in `blueprint-validation`.
//! This crate is where they meet a schema.

mod argmap;
mod caster;
mod error;
mod factory;
mod registry;
mod schema;
mod thunk;
mod walker;

pub mod evaluator;

pub use argmap::{ArgumentMap, ExtraneousEntry, Resolved};
pub use caster::{try_cast, CastFailure};
pub use error::{EngineError, ExitCategory};
pub use factory::{FunctionMetaFactory, FunctionRef, StandardMetaFactory, SubclassMetaFactory};
pub use registry::{RegistryError, SchemaRegistry};
pub use schema::{FactoryError, Field, FieldKind, MetaFactory, PolymorphicField, RecordSchema};
pub use thunk::{ParamRef, Thunk, ThunkBody};
pub use walker::walk;
