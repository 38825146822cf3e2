//! The lazy evaluator (§4.5): resolves a thunk graph via DFS with a result
//! cache and an in-progress set for O(n) cycle detection.

use std::collections::{BTreeMap, HashMap, HashSet};

use blueprint_types::{ConcreteValue, Path};

use crate::error::EngineError;
use crate::thunk::{ParamRef, Thunk, ThunkBody};

/// Resolves the thunk graph to a concrete value, starting from `root`.
///
/// (E1) each thunk is invoked at most once; (E2) cached values are never
/// mutated; (E3) a failing thunk aborts the whole evaluation — no partial
/// tree is returned.
#[tracing::instrument(level = "debug", skip_all)]
pub fn evaluate(thunks: &HashMap<Path, Thunk>, root: &Path) -> Result<ConcreteValue, EngineError> {
    let mut cache = HashMap::new();
    let mut in_progress = HashSet::new();
    let mut stack = Vec::new();
    resolve(root, thunks, &mut cache, &mut in_progress, &mut stack)
}

fn resolve(
    path: &Path,
    thunks: &HashMap<Path, Thunk>,
    cache: &mut HashMap<Path, ConcreteValue>,
    in_progress: &mut HashSet<Path>,
    stack: &mut Vec<Path>,
) -> Result<ConcreteValue, EngineError> {
    if let Some(value) = cache.get(path) {
        tracing::warn!(path = %path, "evaluation cache hit");
        return Ok(value.clone());
    }
    if in_progress.contains(path) {
        let mut cycle_stack: Vec<String> = stack.iter().map(Path::to_string).collect();
        cycle_stack.push(path.to_string());
        return Err(EngineError::Cycle { stack: cycle_stack });
    }

    let thunk = thunks
        .get(path)
        .expect("resolve is only called on paths the walker guaranteed a thunk for");

    tracing::trace!(path = %path, "resolving thunk");
    in_progress.insert(path.clone());
    stack.push(path.clone());
    let result = eval_thunk(path, thunk, thunks, cache, in_progress, stack);
    stack.pop();
    in_progress.remove(path);

    let value = result?;
    cache.insert(path.clone(), value.clone());
    Ok(value)
}

fn resolve_kwarg(
    parent: &Path,
    pref: &ParamRef,
    thunks: &HashMap<Path, Thunk>,
    cache: &mut HashMap<Path, ConcreteValue>,
    in_progress: &mut HashSet<Path>,
    stack: &mut Vec<Path>,
) -> Result<ConcreteValue, EngineError> {
    if !thunks.contains_key(&pref.0) {
        return Err(EngineError::UnresolvedReference {
            path: parent.to_string(),
            target: pref.0.to_string(),
        });
    }
    resolve(&pref.0, thunks, cache, in_progress, stack)
}

fn eval_thunk(
    path: &Path,
    thunk: &Thunk,
    thunks: &HashMap<Path, Thunk>,
    cache: &mut HashMap<Path, ConcreteValue>,
    in_progress: &mut HashSet<Path>,
    stack: &mut Vec<Path>,
) -> Result<ConcreteValue, EngineError> {
    match &thunk.body {
        ThunkBody::Value(value) => Ok(value.clone()),
        ThunkBody::Identity => {
            let pref = thunk.kwargs.get("v").expect("identity thunk always carries a 'v' kwarg");
            resolve_kwarg(path, pref, thunks, cache, in_progress, stack)
        }
        ThunkBody::Computed(compute) => {
            let mut resolved = BTreeMap::new();
            for (name, pref) in &thunk.kwargs {
                resolved.insert(name.clone(), resolve_kwarg(path, pref, thunks, cache, in_progress, stack)?);
            }
            compute(&resolved).map_err(|source| EngineError::Construction {
                path: path.to_string(),
                source,
            })
        }
        ThunkBody::CollectArray(order) => {
            let mut items = Vec::with_capacity(order.len());
            for name in order {
                let pref = thunk.kwargs.get(name).expect("order is derived from kwargs' own keys");
                items.push(resolve_kwarg(path, pref, thunks, cache, in_progress, stack)?);
            }
            Ok(ConcreteValue::Array(items))
        }
        ThunkBody::CollectTuple(order) => {
            let mut items = Vec::with_capacity(order.len());
            for name in order {
                let pref = thunk.kwargs.get(name).expect("order is derived from kwargs' own keys");
                items.push(resolve_kwarg(path, pref, thunks, cache, in_progress, stack)?);
            }
            Ok(ConcreteValue::Tuple(items))
        }
        ThunkBody::CollectRecord(order, plan) => {
            let mut fields = Vec::with_capacity(order.len());
            for name in order {
                let pref = thunk.kwargs.get(name).expect("order is derived from kwargs' own keys");
                fields.push((name.clone(), resolve_kwarg(path, pref, thunks, cache, in_progress, stack)?));
            }
            blueprint_validation::munge_and_validate(ConcreteValue::Record(fields), plan)
                .map_err(EngineError::from)
        }
    }
}
