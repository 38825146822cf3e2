//! The type algebra (§4.6): the closed set of declared-type forms a schema
//! field can carry.

use std::fmt;

/// A scalar appearing in a `literal<...>` type form.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Str(s) => write!(f, "{s:?}"),
            LiteralValue::Int(i) => write!(f, "{i}"),
            LiteralValue::Float(x) => write!(f, "{x}"),
            LiteralValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A key of a `map_schema<{...}>` type form.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSchemaKey {
    pub name: String,
    pub ty: Type,
    pub required: bool,
}

/// The type algebra. See the table in SPEC_FULL.md §4.6.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    String,
    Integer,
    Float,
    Boolean,
    /// `array<T>`: homogeneous sequence. May be populated either from a
    /// single comma-split token or via variadic index expansion (§4.4).
    Array(Box<Type>),
    /// `map<K,V>`: key/value pairs.
    Map(Box<Type>, Box<Type>),
    /// `union<T1,...,Tn>`: first successful cast wins, in declaration order.
    Union(Vec<Type>),
    /// `literal<v1,...,vn>`: must parse to one of the listed scalars.
    Literal(Vec<LiteralValue>),
    /// `enum<v1,...,vn>`: as literal, but restricted to (typically string) names.
    Enum(Vec<String>),
    /// `optional<T>`: union with `null`.
    Optional(Box<Type>),
    /// `path`: a string with `~` home-directory expansion.
    Path,
    Date,
    Time,
    DateTime,
    /// `bytes`: UTF-8 or base64 per a leading `base64:` tag.
    Bytes,
    /// `mapset<T>`: unordered, de-duplicated collection.
    MapSet(Box<Type>),
    /// `function(arity?)`: `module:name/arity` or bare `name/arity`.
    Function(Option<usize>),
    /// `map_schema<{k: (T, req?)...}>`: structural, expanded by the schema
    /// walker rather than cast from a single token.
    MapSchema(Vec<MapSchemaKey>),
    /// `tuple<T0,...,Tn-1>`: heterogeneous, expanded by the schema walker.
    Tuple(Vec<Type>),
}

impl Type {
    /// Returns whether this type form is cast from a single raw token by the
    /// type caster, as opposed to being expanded structurally by the schema
    /// walker (map_schema, tuple).
    pub fn is_scalar_castable(&self) -> bool {
        !matches!(self, Type::MapSchema(_) | Type::Tuple(_))
    }

    /// Stable human-readable representation, used in error messages and help.
    pub fn type_repr(&self) -> String {
        match self {
            Type::String => "string".to_string(),
            Type::Integer => "integer".to_string(),
            Type::Float => "float".to_string(),
            Type::Boolean => "boolean".to_string(),
            Type::Array(t) => format!("array<{}>", t.type_repr()),
            Type::Map(k, v) => format!("map<{},{}>", k.type_repr(), v.type_repr()),
            Type::Union(ts) => format!(
                "union<{}>",
                ts.iter().map(Type::type_repr).collect::<Vec<_>>().join(",")
            ),
            Type::Literal(vs) => format!(
                "literal<{}>",
                vs.iter().map(LiteralValue::to_string).collect::<Vec<_>>().join(",")
            ),
            Type::Enum(vs) => format!("enum<{}>", vs.join(",")),
            Type::Optional(t) => format!("optional<{}>", t.type_repr()),
            Type::Path => "path".to_string(),
            Type::Date => "date".to_string(),
            Type::Time => "time".to_string(),
            Type::DateTime => "datetime".to_string(),
            Type::Bytes => "bytes".to_string(),
            Type::MapSet(t) => format!("mapset<{}>", t.type_repr()),
            Type::Function(arity) => match arity {
                Some(n) => format!("function({n})"),
                None => "function".to_string(),
            },
            Type::MapSchema(keys) => format!(
                "map_schema<{{{}}}>",
                keys.iter()
                    .map(|k| format!("{}: ({}, {})", k.name, k.ty.type_repr(), k.required))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Type::Tuple(ts) => format!(
                "tuple<{}>",
                ts.iter().map(Type::type_repr).collect::<Vec<_>>().join(",")
            ),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_repr())
    }
}
