//! Thunks (§3, §4.5): deferred compute nodes the walker emits and the
//! evaluator resolves.

use std::collections::HashMap;

use blueprint_types::{ComputeFn, ConcreteValue, Path};
use blueprint_validation::RecordPlan;

/// A resolved handle to another path in the thunk graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamRef(pub Path);

/// What a [`Thunk`] does with its resolved `kwargs`.
pub enum ThunkBody {
    /// Already-typed; ignores `kwargs`.
    Value(ConcreteValue),
    /// Passes through a single resolved kwarg named `"v"` (references).
    Identity,
    /// A user-supplied derivation over named, already-resolved sources.
    Computed(ComputeFn),
    /// Builds a `ConcreteValue::Array` from the named kwargs, in this order.
    CollectArray(Vec<String>),
    /// Builds a `ConcreteValue::Tuple` from the named kwargs, in this order.
    CollectTuple(Vec<String>),
    /// Builds a `ConcreteValue::Record` from the named kwargs, in field
    /// declaration order, then runs mungers and validators over it.
    CollectRecord(Vec<String>, RecordPlan),
}

pub struct Thunk {
    pub path: Path,
    pub kwargs: HashMap<String, ParamRef>,
    pub body: ThunkBody,
}

impl Thunk {
    pub fn value(path: Path, value: ConcreteValue) -> Thunk {
        Thunk {
            path,
            kwargs: HashMap::new(),
            body: ThunkBody::Value(value),
        }
    }

    pub fn identity(path: Path, target: Path) -> Thunk {
        let mut kwargs = HashMap::new();
        kwargs.insert("v".to_string(), ParamRef(target));
        Thunk {
            path,
            kwargs,
            body: ThunkBody::Identity,
        }
    }

    pub fn computed(path: Path, sources: std::collections::BTreeMap<String, Path>, compute: ComputeFn) -> Thunk {
        let kwargs = sources.into_iter().map(|(name, target)| (name, ParamRef(target))).collect();
        Thunk {
            path,
            kwargs,
            body: ThunkBody::Computed(compute),
        }
    }
}
