//! Low-level splitting of a single argv token into its key/operator/value
//! parts, before any path validation happens.

/// The operator that separated a token's key from its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOp {
    /// `key=value`.
    Assign,
    /// `key@=target`.
    Reference,
}

/// The raw, un-validated pieces of a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawToken<'a> {
    /// `--help` or `-h`.
    Help,
    /// A `key=value` or `key@=target` pair, not yet path-validated.
    Pair {
        key: &'a str,
        op: TokenOp,
        payload: &'a str,
    },
    /// Neither form matched.
    Malformed,
}

/// Splits a single token string into its raw constituent parts.
///
/// `@=` is checked before `=` since it is a strict superstring pattern
/// (`key@=target` would otherwise also match the bare `=` rule at the wrong
/// offset).
pub fn split_token(token: &str) -> RawToken<'_> {
    if token == "--help" || token == "-h" {
        return RawToken::Help;
    }
    if let Some(idx) = token.find("@=") {
        return RawToken::Pair {
            key: &token[..idx],
            op: TokenOp::Reference,
            payload: &token[idx + 2..],
        };
    }
    if let Some(idx) = token.find('=') {
        return RawToken::Pair {
            key: &token[..idx],
            op: TokenOp::Assign,
            payload: &token[idx + 1..],
        };
    }
    RawToken::Malformed
}

/// Strips a single leading `--` or `--`-then-`-` hyphen prefix from a key, as
/// used by `allow_hyphens` mode. `--` is preferred over `-` when both could
/// apply (`--foo` strips to `foo`, not `-foo`).
pub fn strip_hyphen_prefix(key: &str) -> &str {
    key.strip_prefix("--")
        .or_else(|| key.strip_prefix('-'))
        .unwrap_or(key)
}
