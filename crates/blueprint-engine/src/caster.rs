//! The type caster (§4.6): maps a raw string token to a [`ConcreteValue`]
//! against a declared [`Type`].

use std::collections::HashSet;

use blueprint_types::{ConcreteValue, LiteralValue, Type};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::factory::FunctionRef;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct CastFailure {
    pub reason: String,
}

fn fail(reason: impl Into<String>) -> CastFailure {
    CastFailure { reason: reason.into() }
}

/// Casts `raw` to a [`ConcreteValue`] per `ty`'s semantics (§4.6's table).
///
/// `ty` must satisfy [`Type::is_scalar_castable`] — `MapSchema` and `Tuple`
/// are expanded structurally by the schema walker and have no single-token
/// form.
#[tracing::instrument(level = "trace", skip(raw))]
pub fn try_cast(raw: &str, ty: &Type) -> Result<ConcreteValue, CastFailure> {
    match ty {
        Type::String => Ok(ConcreteValue::String(raw.to_string())),
        Type::Integer => raw
            .trim()
            .parse::<i64>()
            .map(ConcreteValue::Integer)
            .map_err(|_| fail(format!("'{raw}' is not a valid integer"))),
        Type::Float => raw
            .trim()
            .parse::<f64>()
            .map(ConcreteValue::Float)
            .map_err(|_| fail(format!("'{raw}' is not a valid float"))),
        Type::Boolean => cast_bool(raw),
        Type::Array(inner) => cast_array(raw, inner),
        Type::Map(key_ty, value_ty) => cast_map(raw, key_ty, value_ty),
        Type::Union(variants) => cast_union(raw, variants),
        Type::Literal(values) => cast_literal(raw, values),
        Type::Enum(names) => cast_enum(raw, names),
        Type::Optional(inner) => cast_optional(raw, inner),
        Type::Path => Ok(ConcreteValue::String(expand_home(raw))),
        Type::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(ConcreteValue::Date)
            .map_err(|_| fail(format!("'{raw}' is not a valid ISO-8601 date"))),
        Type::Time => NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S%.f"))
            .map(ConcreteValue::Time)
            .map_err(|_| fail(format!("'{raw}' is not a valid ISO-8601 time"))),
        Type::DateTime => DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| ConcreteValue::DateTime(dt.with_timezone(&Utc)))
            .map_err(|_| fail(format!("'{raw}' is not a valid ISO-8601 datetime"))),
        Type::Bytes => cast_bytes(raw),
        Type::MapSet(inner) => cast_mapset(raw, inner),
        Type::Function(arity) => cast_function(raw, *arity),
        Type::MapSchema(_) | Type::Tuple(_) => Err(fail(
            "this type is expanded structurally by the schema walker, not castable from a single token",
        )),
    }
}

fn cast_bool(raw: &str) -> Result<ConcreteValue, CastFailure> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(ConcreteValue::Boolean(true)),
        "false" | "no" | "0" => Ok(ConcreteValue::Boolean(false)),
        other => Err(fail(format!("'{other}' is not a valid boolean"))),
    }
}

/// Splits `raw` on top-level commas. An empty token yields an empty list
/// rather than a single empty-string element — there is no useful way to
/// write a one-element array containing the empty string as a bare token.
fn split_tokens(raw: &str) -> Vec<&str> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(',').collect()
    }
}

fn cast_array(raw: &str, inner: &Type) -> Result<ConcreteValue, CastFailure> {
    let elements = split_tokens(raw)
        .into_iter()
        .map(|tok| try_cast(tok.trim(), inner))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ConcreteValue::Array(elements))
}

fn cast_mapset(raw: &str, inner: &Type) -> Result<ConcreteValue, CastFailure> {
    let mut seen = HashSet::new();
    let mut elements = Vec::new();
    for tok in split_tokens(raw) {
        let value = try_cast(tok.trim(), inner)?;
        let key = format!("{value:?}");
        if seen.insert(key) {
            elements.push(value);
        }
    }
    Ok(ConcreteValue::MapSet(elements))
}

fn cast_map(raw: &str, key_ty: &Type, value_ty: &Type) -> Result<ConcreteValue, CastFailure> {
    let mut pairs = Vec::new();
    for tok in split_tokens(raw) {
        let (k, v) = tok
            .split_once(':')
            .ok_or_else(|| fail(format!("'{tok}' is not a valid 'key:value' map entry")))?;
        pairs.push((try_cast(k.trim(), key_ty)?, try_cast(v.trim(), value_ty)?));
    }
    Ok(ConcreteValue::Map(pairs))
}

fn cast_union(raw: &str, variants: &[Type]) -> Result<ConcreteValue, CastFailure> {
    for variant in variants {
        if let Ok(value) = try_cast(raw, variant) {
            return Ok(value);
        }
    }
    Err(fail(format!(
        "'{raw}' did not match any of: {}",
        variants.iter().map(Type::type_repr).collect::<Vec<_>>().join(", ")
    )))
}

fn cast_literal(raw: &str, values: &[LiteralValue]) -> Result<ConcreteValue, CastFailure> {
    for value in values {
        let matches = match value {
            LiteralValue::Str(s) => raw == s,
            LiteralValue::Int(i) => raw.trim().parse::<i64>().map(|n| n == *i).unwrap_or(false),
            LiteralValue::Float(x) => raw.trim().parse::<f64>().map(|n| n == *x).unwrap_or(false),
            LiteralValue::Bool(b) => cast_bool(raw).ok() == Some(ConcreteValue::Boolean(*b)),
        };
        if matches {
            return Ok(literal_to_concrete(value));
        }
    }
    Err(fail(format!(
        "'{raw}' is not one of the allowed literals: {}",
        values.iter().map(LiteralValue::to_string).collect::<Vec<_>>().join(", ")
    )))
}

fn literal_to_concrete(value: &LiteralValue) -> ConcreteValue {
    match value {
        LiteralValue::Str(s) => ConcreteValue::String(s.clone()),
        LiteralValue::Int(i) => ConcreteValue::Integer(*i),
        LiteralValue::Float(x) => ConcreteValue::Float(*x),
        LiteralValue::Bool(b) => ConcreteValue::Boolean(*b),
    }
}

fn cast_enum(raw: &str, names: &[String]) -> Result<ConcreteValue, CastFailure> {
    if names.iter().any(|n| n == raw) {
        Ok(ConcreteValue::String(raw.to_string()))
    } else {
        Err(fail(format!("'{raw}' is not one of: {}", names.join(", "))))
    }
}

fn cast_optional(raw: &str, inner: &Type) -> Result<ConcreteValue, CastFailure> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        Ok(ConcreteValue::Null)
    } else {
        try_cast(raw, inner)
    }
}

fn expand_home(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix('~') {
        if let Some(home) = home::home_dir() {
            let home = home.to_string_lossy().into_owned();
            return format!("{home}{rest}");
        }
    }
    raw.to_string()
}

fn cast_bytes(raw: &str) -> Result<ConcreteValue, CastFailure> {
    use base64::Engine;
    if let Some(encoded) = raw.strip_prefix("base64:") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map(ConcreteValue::Bytes)
            .map_err(|e| fail(format!("invalid base64: {e}")))
    } else {
        Ok(ConcreteValue::Bytes(raw.as_bytes().to_vec()))
    }
}

fn cast_function(raw: &str, arity: Option<usize>) -> Result<ConcreteValue, CastFailure> {
    let reference = FunctionRef::parse(raw, None).map_err(|e| fail(e.to_string()))?;
    if let Some(expected) = arity {
        if reference.arity != expected {
            return Err(fail(format!("expected arity {expected}, got {}", reference.arity)));
        }
    }
    Ok(ConcreteValue::String(reference.canonical()))
}
