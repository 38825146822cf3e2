//! Assembles raw tokens into `(key, ArgValue)` pairs plus a help flag (§4.1).

use blueprint_types::{ArgValue, Path};

use crate::error::{DuplicateKeyWarning, ParseError};
use crate::tokenizer::{split_token, strip_hyphen_prefix, RawToken, TokenOp};

/// Options controlling how a token sequence is parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Strip a leading `-`/`--` from each key before it is recorded.
    pub allow_hyphens: bool,
}

/// The result of parsing a token sequence: an ordered list of key/value
/// pairs (the key is kept raw — it may still contain `...` wildcard
/// segments, which `blueprint-engine` interprets) plus whether `--help`/`-h`
/// was present.
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    pub pairs: Vec<(String, ArgValue)>,
    pub help: bool,
    /// Non-fatal observations (e.g. a key repeated within this token
    /// sequence) collected for the caller to surface as warnings.
    pub warnings: Vec<DuplicateKeyWarning>,
}

/// Parses an ordered sequence of string tokens per the grammar in §6.1.
///
/// Within a single call, a repeated key keeps only its last value
/// (last-wins) and records a [`DuplicateKeyWarning`]; this is the "optional"
/// `DuplicateKeyInSameLayer` behavior from §4.1, enabled by default.
#[tracing::instrument(level = "debug", skip(tokens))]
pub fn parse<S: AsRef<str>>(
    tokens: &[S],
    options: ParseOptions,
) -> Result<ParsedArgs, ParseError> {
    let mut result = ParsedArgs::default();
    let mut seen_at: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for token in tokens {
        let token = token.as_ref();
        match split_token(token) {
            RawToken::Help => {
                result.help = true;
            }
            RawToken::Malformed => {
                return Err(ParseError::MalformedToken {
                    token: token.to_string(),
                });
            }
            RawToken::Pair { key, op, payload } => {
                let key = if options.allow_hyphens {
                    strip_hyphen_prefix(key)
                } else {
                    key
                };
                let value = match op {
                    TokenOp::Assign => ArgValue::castable(payload),
                    TokenOp::Reference => {
                        if payload.contains("...") {
                            return Err(ParseError::InvalidReferenceTarget {
                                target: payload.to_string(),
                                reason: "references cannot contain wildcards".to_string(),
                            });
                        }
                        let target = Path::parse(payload).map_err(|e| {
                            ParseError::InvalidReferenceTarget {
                                target: payload.to_string(),
                                reason: e.to_string(),
                            }
                        })?;
                        ArgValue::reference(target)
                    }
                };

                if let Some(&existing_idx) = seen_at.get(key) {
                    result.warnings.push(DuplicateKeyWarning {
                        key: key.to_string(),
                    });
                    result.pairs[existing_idx] = (key.to_string(), value);
                } else {
                    seen_at.insert(key.to_string(), result.pairs.len());
                    result.pairs.push((key.to_string(), value));
                }
            }
        }
    }

    tracing::debug!(pairs = result.pairs.len(), help = result.help, "parsed tokens");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_basic_assign() {
        let parsed = parse(&["name=test", "count=3"], ParseOptions::default()).unwrap();
        assert_eq!(parsed.pairs.len(), 2);
        assert!(!parsed.help);
    }

    #[test]
    fn test_reference_token() {
        let parsed = parse(&["a=5", "b@=a"], ParseOptions::default()).unwrap();
        assert!(matches!(parsed.pairs[1].1, ArgValue::Reference(_)));
    }

    #[test]
    fn test_reference_with_wildcard_target_rejected() {
        let err = parse(&["b@=a...c"], ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidReferenceTarget { .. }));
    }

    #[test]
    fn test_help_flag() {
        let parsed = parse(&["--help"], ParseOptions::default()).unwrap();
        assert!(parsed.help);
        assert!(parsed.pairs.is_empty());

        let parsed = parse(&["-h"], ParseOptions::default()).unwrap();
        assert!(parsed.help);
    }

    #[test]
    fn test_malformed_token() {
        let err = parse(&["garbage"], ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::MalformedToken { .. }));
    }

    #[test_case("--rate=0.5", true, "rate" ; "double hyphen stripped")]
    #[test_case("-rate=0.5", true, "rate" ; "single hyphen stripped")]
    #[test_case("rate=0.5", true, "rate" ; "no hyphen present")]
    fn test_allow_hyphens(token: &str, allow_hyphens: bool, expected_key: &str) {
        let parsed = parse(&[token], ParseOptions { allow_hyphens }).unwrap();
        assert_eq!(parsed.pairs[0].0, expected_key);
    }

    #[test]
    fn test_hyphens_kept_when_not_allowed() {
        let parsed = parse(&["--rate=0.5"], ParseOptions::default()).unwrap();
        assert_eq!(parsed.pairs[0].0, "--rate");
    }

    #[test]
    fn test_duplicate_key_last_wins_with_warning() {
        let parsed = parse(&["a=1", "a=2"], ParseOptions::default()).unwrap();
        assert_eq!(parsed.pairs.len(), 1);
        assert_eq!(parsed.warnings.len(), 1);
        match &parsed.pairs[0].1 {
            ArgValue::Castable(s) => assert_eq!(s, "2"),
            other => panic!("expected Castable, got {other:?}"),
        }
    }

    #[test]
    fn test_wildcard_key_passes_through_uninterpreted() {
        let parsed = parse(&["...x=7"], ParseOptions::default()).unwrap();
        assert_eq!(parsed.pairs[0].0, "...x");
    }
}
