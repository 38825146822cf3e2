//! The facade's error type: every engine/parser failure plus the help-request
//! pseudo-error that lets `make` short-circuit construction (§7: "on help
//! request, the engine returns formatted help instead of attempting
//! construction").

use blueprint_engine::ExitCategory;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Parse(#[from] blueprint_parser::ParseError),

    #[error("invalid key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: blueprint_types::PathError,
    },

    #[error(transparent)]
    Engine(#[from] blueprint_engine::EngineError),

    /// `--help`/`-h` was seen; `make` did not attempt construction.
    #[error("help requested")]
    HelpRequested(String),
}

impl ApiError {
    /// The rendered help text, if this is a [`ApiError::HelpRequested`].
    pub fn help_text(&self) -> Option<&str> {
        match self {
            ApiError::HelpRequested(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// The exit category a CLI wrapper should map this error to (§6.3).
    pub fn exit_category(&self) -> ExitCategory {
        match self {
            ApiError::Engine(e) => e.exit_category(),
            ApiError::Parse(_) | ApiError::InvalidKey { .. } | ApiError::HelpRequested(_) => ExitCategory::UserInput,
        }
    }
}
