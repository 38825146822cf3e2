//! Argument values and the concrete value tree produced by construction.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::path::Path;

/// Error raised by a user-supplied [`Computed`] compute function.
#[derive(Debug, Clone, thiserror::Error)]
#[error("computed value failed: {message}")]
pub struct ComputeError {
    pub message: String,
}

impl ComputeError {
    pub fn new(message: impl Into<String>) -> Self {
        ComputeError {
            message: message.into(),
        }
    }
}

/// A user-supplied function deriving a value from named, already-resolved sources.
pub type ComputeFn =
    Arc<dyn Fn(&BTreeMap<String, ConcreteValue>) -> Result<ConcreteValue, ComputeError> + Send + Sync>;

/// A value derived from other parameters at evaluation time.
#[derive(Clone)]
pub struct Computed {
    /// Named source paths consulted by `compute`.
    pub sources: BTreeMap<String, Path>,
    pub compute: ComputeFn,
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

/// A tagged sum of the forms an argument entry can take before construction.
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// A raw string awaiting type-directed coercion.
    Castable(String),
    /// An alias to another parameter path. The target must not contain wildcards.
    Reference(Path),
    /// A value derived from other (already-resolved) parameters.
    Computed(Computed),
    /// A value that is already typed and needs no further casting.
    Concrete(ConcreteValue),
}

impl ArgValue {
    pub fn castable(raw: impl Into<String>) -> Self {
        ArgValue::Castable(raw.into())
    }

    pub fn reference(target: Path) -> Self {
        ArgValue::Reference(target)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, ArgValue::Reference(_))
    }
}

/// The fully-typed value tree produced by a construction.
///
/// This is the result type for every leaf, list, tuple, map-schema and record
/// node the schema walker can produce; it is also what mungers and validators
/// operate on.
#[derive(Debug, Clone, PartialEq)]
pub enum ConcreteValue {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    /// A homogeneous sequence (`array<T>`).
    Array(Vec<ConcreteValue>),
    /// An unordered, de-duplicated collection (`mapset<T>`).
    MapSet(Vec<ConcreteValue>),
    /// Key/value pairs (`map<K,V>`); kept as an ordered association list since
    /// `K` may not be a type usable as a `HashMap` key (e.g. `float`).
    Map(Vec<(ConcreteValue, ConcreteValue)>),
    /// A heterogeneous, fixed-arity tuple (`tuple<T0,...,Tn-1>`).
    Tuple(Vec<ConcreteValue>),
    /// A record or map-schema: an ordered list of named fields.
    Record(Vec<(String, ConcreteValue)>),
}

impl ConcreteValue {
    /// Returns whether this value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, ConcreteValue::Null)
    }

    /// Looks up a field by name if this is a `Record`.
    pub fn field(&self, name: &str) -> Option<&ConcreteValue> {
        match self {
            ConcreteValue::Record(fields) => {
                fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Returns the inner string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConcreteValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConcreteValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConcreteValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}
