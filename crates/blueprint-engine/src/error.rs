//! The engine-level error taxonomy (§7).
//!
//! Every fallible engine operation funnels into [`EngineError`]. Variants are
//! grouped by the taxonomy's six semantic categories (not by originating
//! module), matching `automapper-validation::error::ValidationError`'s flat,
//! named-field style.

use blueprint_types::ComputeError;

/// The exit-code category a CLI wrapper should map an [`EngineError`] to
/// (§6.3). The engine never calls `std::process::exit` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCategory {
    /// Parse, cast, extraneous-argument or missing-required-argument errors.
    UserInput,
    /// A field or record validator rejected the constructed value.
    Validation,
    /// An unresolved reference or a cycle in the thunk graph.
    ReferenceOrCycle,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("malformed token '{token}'")]
    MalformedToken { token: String },

    #[error("invalid reference target '{target}': {reason}")]
    InvalidReferenceTarget { target: String, reason: String },

    #[error("missing required parameter '{path}'")]
    MissingRequired { path: String },

    #[error("extraneous argument '{path}' in layer '{layer_name}'")]
    ExtraneousArgument {
        path: String,
        layer_name: String,
        suggestions: Vec<String>,
    },

    #[error("unknown subtype '{token}' for '{path}'; valid: {}", valid.join(", "))]
    UnknownSubtype {
        path: String,
        token: String,
        valid: Vec<String>,
    },

    #[error("cannot cast '{raw}' at '{path}' to {type_repr}: {reason}")]
    CastError {
        path: String,
        raw: String,
        type_repr: String,
        reason: String,
    },

    #[error("reference at '{path}' targets nonexistent path '{target}'")]
    UnresolvedReference { path: String, target: String },

    #[error("cycle detected: {}", stack.join(" -> "))]
    Cycle { stack: Vec<String> },

    /// A thunk's compute function raised, wrapped with the path it was
    /// computing (§4.5, "Construction" category).
    #[error("construction failed at '{path}': {}", source.message)]
    Construction { path: String, source: ComputeError },

    #[error(transparent)]
    Validation(#[from] blueprint_validation::ValidationError),

    #[error("schema registry conflict for '{key}'")]
    RegistryConflict { key: String },
}

impl EngineError {
    /// Maps this error to the exit-code category a CLI wrapper should use
    /// (§6.3). Construction errors (a thunk's compute function raised) are
    /// treated as user input errors: the most common cause is a bad
    /// `Computed` expression supplied alongside the rest of the argument
    /// layer.
    pub fn exit_category(&self) -> ExitCategory {
        match self {
            EngineError::MalformedToken { .. }
            | EngineError::InvalidReferenceTarget { .. }
            | EngineError::MissingRequired { .. }
            | EngineError::ExtraneousArgument { .. }
            | EngineError::UnknownSubtype { .. }
            | EngineError::CastError { .. }
            | EngineError::Construction { .. }
            | EngineError::RegistryConflict { .. } => ExitCategory::UserInput,
            EngineError::Validation(_) => ExitCategory::Validation,
            EngineError::UnresolvedReference { .. } | EngineError::Cycle { .. } => {
                ExitCategory::ReferenceOrCycle
            }
        }
    }
}
