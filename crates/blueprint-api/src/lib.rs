//! The language-neutral facade over the Blueprint engine (§6.2).
//!
//! This is the crate an embedder links against: `blueprint-types`,
//! `blueprint-parser` and `blueprint-engine` are the machinery; this crate is
//! the five-function surface (`new_blueprint`, `apply`, `apply_argv`, `make`,
//! `help`, `to_argv`) that wraps it. A declarative schema DSL and a
//! process-argv CLI wrapper are named out of scope (§1) and would sit above
//! this crate, not inside it.

mod blueprint;
mod error;

pub use blueprint::{new_blueprint, ApplyArgvOptions, Blueprint};
pub use error::ApiError;

pub use blueprint_engine::ExitCategory;
