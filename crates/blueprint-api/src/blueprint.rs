//! The `Blueprint` facade (§6.2): the only entry point a caller outside this
//! workspace needs. It owns a target schema and an ordered stack of layers,
//! and hands both to `blueprint_engine` for walking and evaluation.

use std::sync::Arc;

use blueprint_engine::{ArgumentMap, EngineError, RecordSchema};
use blueprint_parser::{parse, ParseOptions};
use blueprint_types::{ArgValue, ConcreteValue, Layer, Path, PathError};

use crate::error::ApiError;

/// Options for [`Blueprint::apply_argv`].
#[derive(Debug, Clone)]
pub struct ApplyArgvOptions {
    /// Strip a leading `-`/`--` from every key before parsing.
    pub allow_hyphens: bool,
    /// Reject extraneous keys as a hard error instead of logging a warning.
    pub strict: bool,
    /// The name recorded for this layer (error messages, I5 traceability).
    pub layer_name: String,
}

impl Default for ApplyArgvOptions {
    fn default() -> Self {
        ApplyArgvOptions {
            allow_hyphens: false,
            strict: false,
            layer_name: "argv".to_string(),
        }
    }
}

/// The accumulated state a value is constructed from: a target schema plus
/// every layer applied so far, in order (§3 "Blueprint").
#[derive(Clone)]
pub struct Blueprint {
    schema: Arc<RecordSchema>,
    layers: Vec<Layer>,
    strict: bool,
    help_requested: bool,
}

/// Starts a fresh blueprint targeting `schema`, with no layers applied.
pub fn new_blueprint(schema: Arc<RecordSchema>) -> Blueprint {
    Blueprint {
        schema,
        layers: Vec::new(),
        strict: false,
        help_requested: false,
    }
}

impl Blueprint {
    /// Appends a layer built directly from already-typed entries — no
    /// parsing, no wildcards (a [`Path`] cannot express one).
    pub fn apply(mut self, entries: impl IntoIterator<Item = (Path, ArgValue)>, layer_name: impl Into<String>) -> Blueprint {
        let mut layer = Layer::new(layer_name);
        for (path, value) in entries {
            layer.insert_qualified(path, value);
        }
        self.layers.push(layer);
        self
    }

    /// Parses `tokens` (§4.1 grammar) and appends the resulting layer.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn apply_argv(mut self, tokens: &[impl AsRef<str>], options: ApplyArgvOptions) -> Result<Blueprint, ApiError> {
        let parsed = parse(
            tokens,
            ParseOptions {
                allow_hyphens: options.allow_hyphens,
            },
        )?;
        for warning in &parsed.warnings {
            tracing::warn!(key = %warning.key, "duplicate key within layer; last value wins");
        }

        let mut layer = Layer::new(options.layer_name);
        for (key, value) in parsed.pairs {
            if key.contains("...") {
                layer.push_wildcard(key, value);
                continue;
            }
            match Path::parse(&key) {
                Ok(path) => layer.insert_qualified(path, value),
                Err(source) => {
                    // A leading hyphen without `allow_hyphens` is recoverable:
                    // §8 scenario 6 expects it to surface from `make` as an
                    // extraneous key with a hint to enable `allow_hyphens`,
                    // not abort `apply_argv` outright. Anything else invalid
                    // about the key is a hard error.
                    let hyphen_leading = match &source {
                        PathError::InvalidSegment { segment, .. } => segment.starts_with('-'),
                    };
                    if hyphen_leading {
                        layer.push_unparseable(key, value);
                    } else {
                        return Err(ApiError::InvalidKey { key, source });
                    }
                }
            }
        }
        self.layers.push(layer);
        self.help_requested = self.help_requested || parsed.help;
        self.strict = options.strict;
        Ok(self)
    }

    /// Walks the schema over the accumulated layers and evaluates the thunk
    /// graph to a concrete value.
    ///
    /// If a prior `apply_argv` saw `--help`/`-h`, construction is skipped and
    /// [`ApiError::HelpRequested`] is returned carrying the rendered help
    /// text (§7). Otherwise, extraneous keys are either a hard
    /// [`EngineError::ExtraneousArgument`] (strict mode) or a logged warning.
    pub fn make(&self) -> Result<ConcreteValue, ApiError> {
        if self.help_requested {
            return Err(ApiError::HelpRequested(self.help(false)));
        }
        let mut args = ArgumentMap::new(self.layers.clone());
        let thunks = blueprint_engine::walk(&self.schema, &mut args)?;
        let value = blueprint_engine::evaluator::evaluate(&thunks, &Path::root())?;

        let known: Vec<Path> = thunks.keys().cloned().collect();
        let extraneous = args.extraneous(&known);
        if !extraneous.is_empty() {
            if self.strict {
                let first = extraneous.into_iter().next().expect("checked non-empty above");
                return Err(EngineError::ExtraneousArgument {
                    path: first.path,
                    layer_name: first.layer_name,
                    suggestions: first.suggestions,
                }
                .into());
            }
            for entry in &extraneous {
                tracing::warn!(
                    path = %entry.path,
                    layer = %entry.layer_name,
                    suggestions = ?entry.suggestions,
                    "extraneous argument"
                );
            }
        }
        Ok(value)
    }

    /// Formatted help text for the target schema. With `missing_warnings`,
    /// attempts a construction against the current layers and appends
    /// whatever it failed on.
    pub fn help(&self, missing_warnings: bool) -> String {
        let mut out = String::new();
        render_schema(&self.schema, 0, &mut out);
        if missing_warnings {
            let mut args = ArgumentMap::new(self.layers.clone());
            if let Err(err) = blueprint_engine::walk(&self.schema, &mut args) {
                out.push_str("\nwarnings:\n  ");
                out.push_str(&err.to_string());
                out.push('\n');
            }
        }
        out
    }

    /// Reconstructs argv-style tokens from the accumulated layers (§6.2,
    /// §8's round-trip property). Entries with no textual form (`Concrete`,
    /// `Computed`) are omitted — there is no token syntax for them.
    pub fn to_argv(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        for layer in &self.layers {
            let mut qualified: Vec<(&Path, &ArgValue)> = layer.qualified.iter().collect();
            qualified.sort_by_key(|(path, _)| path.as_str());
            for (path, value) in qualified {
                if let Some(token) = render_token(path.as_str(), value) {
                    tokens.push(token);
                }
            }
            for entry in &layer.wildcard {
                if let Some(token) = render_token(&entry.pattern, &entry.value) {
                    tokens.push(token);
                }
            }
            for (key, value) in &layer.unparseable {
                if let Some(token) = render_token(key, value) {
                    tokens.push(token);
                }
            }
        }
        tokens
    }
}

fn render_token(key: &str, value: &ArgValue) -> Option<String> {
    match value {
        ArgValue::Castable(raw) => Some(format!("{key}={raw}")),
        ArgValue::Reference(target) => Some(format!("{key}@={}", target.as_str())),
        ArgValue::Concrete(_) | ArgValue::Computed(_) => None,
    }
}

fn render_schema(schema: &RecordSchema, indent: usize, out: &mut String) {
    use blueprint_engine::FieldKind;

    let pad = "  ".repeat(indent);
    for field in &schema.fields {
        out.push_str(&pad);
        out.push_str(&field.name);
        match &field.kind {
            FieldKind::Scalar(ty) => {
                out.push_str(": ");
                out.push_str(&ty.type_repr());
            }
            FieldKind::Record(_) => out.push_str(": record"),
            FieldKind::List(_) => out.push_str(": list"),
            FieldKind::Tuple(_) => out.push_str(": tuple"),
            FieldKind::MapSchema(_) => out.push_str(": map_schema"),
            FieldKind::Polymorphic(_) => out.push_str(": polymorphic"),
        }
        if field.required == Some(false) || field.default.is_some() {
            out.push_str(" (optional)");
        }
        if let Some(doc) = &field.doc {
            out.push_str(" -- ");
            out.push_str(doc);
        }
        out.push('\n');
        if let FieldKind::Record(nested) = &field.kind {
            render_schema(nested, indent + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_engine::{Field, FieldKind};
    use blueprint_types::Type;

    fn simple_schema() -> Arc<RecordSchema> {
        Arc::new(RecordSchema {
            fields: vec![
                Field {
                    name: "name".to_string(),
                    kind: FieldKind::Scalar(Type::String),
                    default: None,
                    mungers: vec![],
                    validators: vec![],
                    doc: None,
                    required: None,
                },
                Field {
                    name: "count".to_string(),
                    kind: FieldKind::Scalar(Type::Integer),
                    default: Some(ConcreteValue::Integer(2)),
                    mungers: vec![],
                    validators: vec![],
                    doc: None,
                    required: None,
                },
            ],
            record_validators: vec![],
        })
    }

    #[test]
    fn test_basic_make() {
        let blueprint = new_blueprint(simple_schema())
            .apply_argv(&["name=test", "count=3"], ApplyArgvOptions::default())
            .unwrap();
        let value = blueprint.make().unwrap();
        assert_eq!(value.field("name").unwrap().as_str(), Some("test"));
        assert_eq!(value.field("count").unwrap().as_integer(), Some(3));
    }

    #[test]
    fn test_missing_required_surfaces_as_engine_error() {
        let blueprint = new_blueprint(simple_schema())
            .apply_argv(&["count=3"], ApplyArgvOptions::default())
            .unwrap();
        let err = blueprint.make().unwrap_err();
        assert!(matches!(err, ApiError::Engine(EngineError::MissingRequired { .. })));
    }

    #[test]
    fn test_default_applies_when_absent() {
        let blueprint = new_blueprint(simple_schema())
            .apply_argv(&["name=test"], ApplyArgvOptions::default())
            .unwrap();
        let value = blueprint.make().unwrap();
        assert_eq!(value.field("count").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn test_help_flag_short_circuits_make() {
        let blueprint = new_blueprint(simple_schema())
            .apply_argv(&["--help"], ApplyArgvOptions::default())
            .unwrap();
        let err = blueprint.make().unwrap_err();
        assert!(err.help_text().unwrap().contains("name"));
    }

    #[test]
    fn test_extraneous_key_is_warning_by_default_but_still_constructs() {
        let blueprint = new_blueprint(simple_schema())
            .apply_argv(&["name=test", "naem=oops"], ApplyArgvOptions::default())
            .unwrap();
        let value = blueprint.make().unwrap();
        assert_eq!(value.field("name").unwrap().as_str(), Some("test"));
    }

    #[test]
    fn test_extraneous_key_is_hard_error_in_strict_mode() {
        let options = ApplyArgvOptions {
            strict: true,
            ..ApplyArgvOptions::default()
        };
        let blueprint = new_blueprint(simple_schema()).apply_argv(&["name=test", "naem=oops"], options).unwrap();
        let err = blueprint.make().unwrap_err();
        assert!(matches!(err, ApiError::Engine(EngineError::ExtraneousArgument { .. })));
    }

    #[test]
    fn test_to_argv_round_trips_qualified_entries() {
        let blueprint = new_blueprint(simple_schema())
            .apply_argv(&["name=test", "count=3"], ApplyArgvOptions::default())
            .unwrap();
        let argv = blueprint.to_argv();
        assert_eq!(argv, vec!["count=3".to_string(), "name=test".to_string()]);

        let rebuilt = new_blueprint(simple_schema())
            .apply_argv(&argv, ApplyArgvOptions::default())
            .unwrap();
        assert_eq!(rebuilt.make().unwrap(), blueprint.make().unwrap());
    }

    #[test]
    fn test_apply_with_typed_entries_skips_casting() {
        let blueprint = new_blueprint(simple_schema()).apply(
            vec![
                (Path::parse("name").unwrap(), ArgValue::Concrete(ConcreteValue::String("direct".into()))),
                (Path::parse("count").unwrap(), ArgValue::Concrete(ConcreteValue::Integer(9))),
            ],
            "programmatic",
        );
        let value = blueprint.make().unwrap();
        assert_eq!(value.field("name").unwrap().as_str(), Some("direct"));
        assert_eq!(value.field("count").unwrap().as_integer(), Some(9));
    }

    fn rate_schema() -> Arc<RecordSchema> {
        Arc::new(RecordSchema {
            fields: vec![Field {
                name: "rate".to_string(),
                kind: FieldKind::Scalar(Type::Float),
                default: Some(ConcreteValue::Float(1.0)),
                mungers: vec![],
                validators: vec![],
                doc: None,
                required: None,
            }],
            record_validators: vec![],
        })
    }

    #[test]
    fn test_hyphen_leading_key_is_not_a_hard_parse_error() {
        // §8 scenario 6: a leading hyphen without `allow_hyphens` must not
        // abort `apply_argv` — it has to survive into the argument map so it
        // can be reported as extraneous with the `allow_hyphens` hint.
        let blueprint = new_blueprint(rate_schema())
            .apply_argv(&["--rate=0.5"], ApplyArgvOptions::default())
            .unwrap();
        // Non-strict: the key was never consulted (the schema only looks at
        // "rate"), so it's a warning, not an error, and the default applies.
        let value = blueprint.make().unwrap();
        assert_eq!(value.field("rate"), Some(&ConcreteValue::Float(1.0)));
    }

    #[test]
    fn test_hyphen_leading_key_surfaces_as_extraneous_in_strict_mode() {
        let options = ApplyArgvOptions {
            strict: true,
            ..ApplyArgvOptions::default()
        };
        let blueprint = new_blueprint(rate_schema()).apply_argv(&["--rate=0.5"], options).unwrap();
        let err = blueprint.make().unwrap_err();
        match err {
            ApiError::Engine(EngineError::ExtraneousArgument { path, suggestions, .. }) => {
                assert_eq!(path, "--rate");
                assert!(suggestions.iter().any(|s| s.contains("allow_hyphens")));
            }
            other => panic!("expected ExtraneousArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_key_rejected_at_apply_argv() {
        let err = new_blueprint(simple_schema())
            .apply_argv(&["name..=test"], ApplyArgvOptions::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidKey { .. }));
    }

    #[test]
    fn test_wildcard_key_accepted_and_matched() {
        let blueprint = new_blueprint(simple_schema())
            .apply_argv(&["...name=wild", "count=1"], ApplyArgvOptions::default())
            .unwrap();
        let value = blueprint.make().unwrap();
        assert_eq!(value.field("name").unwrap().as_str(), Some("wild"));
    }
}
