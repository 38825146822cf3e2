//! The schema walker (§4.4): lowers a schema tree into a `Path -> Thunk`
//! graph while consulting the [`ArgumentMap`].

use std::collections::HashMap;

use blueprint_types::{ArgValue, ConcreteValue, Path};
use blueprint_validation::{FieldPlan, RecordPlan, RecordValidator};

use crate::argmap::{ArgumentMap, Resolved};
use crate::caster::try_cast;
use crate::error::EngineError;
use crate::schema::{Field, FieldKind, RecordSchema};
use crate::thunk::Thunk;

/// Walks `schema` rooted at [`Path::root`], returning the thunk graph.
#[tracing::instrument(level = "debug", skip_all)]
pub fn walk(schema: &RecordSchema, args: &mut ArgumentMap) -> Result<HashMap<Path, Thunk>, EngineError> {
    let mut thunks = HashMap::new();
    walk_fields(&Path::root(), &schema.fields, &schema.record_validators, args, &mut thunks)?;
    Ok(thunks)
}

/// Walks one record-shaped node (a `Record`, a `MapSchema`, or the record a
/// resolved `Polymorphic` subtype names) and inserts its own collecting
/// thunk at `prefix`.
fn walk_fields(
    prefix: &Path,
    fields: &[Field],
    record_validators: &[RecordValidator],
    args: &mut ArgumentMap,
    thunks: &mut HashMap<Path, Thunk>,
) -> Result<(), EngineError> {
    let mut order = Vec::with_capacity(fields.len());
    let mut plan = RecordPlan {
        fields: Vec::with_capacity(fields.len()),
        record_validators: record_validators.to_vec(),
    };
    for field in fields {
        let child_path = prefix.join(&field.name);
        walk_field(&child_path, field, args, thunks)?;
        order.push(field.name.clone());
        let mut field_plan = FieldPlan::new(&field.name);
        field_plan.mungers = field.mungers.clone();
        field_plan.validators = field.validators.clone();
        plan.fields.push(field_plan);
    }
    let kwargs = order
        .iter()
        .map(|name| (name.clone(), crate::thunk::ParamRef(prefix.join(name))))
        .collect();
    thunks.insert(
        prefix.clone(),
        Thunk {
            path: prefix.clone(),
            kwargs,
            body: crate::thunk::ThunkBody::CollectRecord(order, plan),
        },
    );
    Ok(())
}

fn walk_field(
    path: &Path,
    field: &Field,
    args: &mut ArgumentMap,
    thunks: &mut HashMap<Path, Thunk>,
) -> Result<(), EngineError> {
    match &field.kind {
        FieldKind::Scalar(ty) => walk_scalar(path, field, ty, args, thunks),
        FieldKind::Record(schema) => walk_nested_record(path, field, schema, args, thunks),
        FieldKind::MapSchema(keys) => walk_nested_map_schema(path, field, keys, args, thunks),
        FieldKind::List(elem) => walk_list(path, field, elem, args, thunks),
        FieldKind::Tuple(elems) => walk_tuple(path, field, elems, args, thunks),
        FieldKind::Polymorphic(poly) => walk_polymorphic(path, field, poly, args, thunks),
    }
}

fn walk_scalar(
    path: &Path,
    field: &Field,
    ty: &blueprint_types::Type,
    args: &mut ArgumentMap,
    thunks: &mut HashMap<Path, Thunk>,
) -> Result<(), EngineError> {
    match args.get(path) {
        Some(Resolved { value: ArgValue::Reference(target), .. }) => {
            thunks.insert(path.clone(), Thunk::identity(path.clone(), target));
            Ok(())
        }
        Some(Resolved { value: ArgValue::Computed(computed), .. }) => {
            thunks.insert(path.clone(), Thunk::computed(path.clone(), computed.sources, computed.compute));
            Ok(())
        }
        Some(Resolved { value: ArgValue::Castable(raw), .. }) => {
            let value = try_cast(&raw, ty).map_err(|e| EngineError::CastError {
                path: path.to_string(),
                raw: raw.clone(),
                type_repr: ty.type_repr(),
                reason: e.reason,
            })?;
            thunks.insert(path.clone(), Thunk::value(path.clone(), value));
            Ok(())
        }
        Some(Resolved { value: ArgValue::Concrete(value), .. }) => {
            thunks.insert(path.clone(), Thunk::value(path.clone(), value));
            Ok(())
        }
        None => emit_absent(path, field, thunks),
    }
}

/// Shared "absent at this path" handling (record/map-schema step 5): emit
/// the default if there is one, else fail required.
fn emit_absent(path: &Path, field: &Field, thunks: &mut HashMap<Path, Thunk>) -> Result<(), EngineError> {
    if let Some(default) = &field.default {
        thunks.insert(path.clone(), Thunk::value(path.clone(), default.clone()));
        Ok(())
    } else if field.is_required() {
        Err(EngineError::MissingRequired { path: path.to_string() })
    } else {
        thunks.insert(path.clone(), Thunk::value(path.clone(), ConcreteValue::Null));
        Ok(())
    }
}

/// Fields whose declared shape is structural (record, map-schema, list,
/// tuple) cannot be populated from a single raw token; only reference,
/// computed and already-concrete entries make sense at the node's own path.
fn structural_lookup(path: &Path, args: &mut ArgumentMap) -> Result<Option<Resolved>, EngineError> {
    match args.get(path) {
        Some(resolved @ Resolved { value: ArgValue::Reference(_), .. }) => Ok(Some(resolved)),
        Some(resolved @ Resolved { value: ArgValue::Computed(_), .. }) => Ok(Some(resolved)),
        Some(resolved @ Resolved { value: ArgValue::Concrete(_), .. }) => Ok(Some(resolved)),
        Some(Resolved { value: ArgValue::Castable(raw), .. }) => Err(EngineError::CastError {
            path: path.to_string(),
            raw,
            type_repr: "record/list/tuple/map_schema".to_string(),
            reason: "this field has a structural shape and cannot be set from a single token".to_string(),
        }),
        None => Ok(None),
    }
}

fn emit_structural_override(path: &Path, resolved: Resolved, thunks: &mut HashMap<Path, Thunk>) {
    match resolved.value {
        ArgValue::Reference(target) => {
            thunks.insert(path.clone(), Thunk::identity(path.clone(), target));
        }
        ArgValue::Computed(computed) => {
            thunks.insert(path.clone(), Thunk::computed(path.clone(), computed.sources, computed.compute));
        }
        ArgValue::Concrete(value) => {
            thunks.insert(path.clone(), Thunk::value(path.clone(), value));
        }
        ArgValue::Castable(_) => unreachable!("filtered out by structural_lookup"),
    }
}

fn walk_nested_record(
    path: &Path,
    field: &Field,
    schema: &RecordSchema,
    args: &mut ArgumentMap,
    thunks: &mut HashMap<Path, Thunk>,
) -> Result<(), EngineError> {
    if let Some(resolved) = structural_lookup(path, args)? {
        emit_structural_override(path, resolved, thunks);
        return Ok(());
    }
    if let Some(default) = &field.default {
        thunks.insert(path.clone(), Thunk::value(path.clone(), default.clone()));
        return Ok(());
    }
    walk_fields(path, &schema.fields, &schema.record_validators, args, thunks)
}

fn walk_nested_map_schema(
    path: &Path,
    field: &Field,
    keys: &[Field],
    args: &mut ArgumentMap,
    thunks: &mut HashMap<Path, Thunk>,
) -> Result<(), EngineError> {
    if let Some(resolved) = structural_lookup(path, args)? {
        emit_structural_override(path, resolved, thunks);
        return Ok(());
    }
    if let Some(default) = &field.default {
        thunks.insert(path.clone(), Thunk::value(path.clone(), default.clone()));
        return Ok(());
    }
    walk_fields(path, keys, &[], args, thunks)
}

fn walk_list(
    path: &Path,
    field: &Field,
    elem: &Field,
    args: &mut ArgumentMap,
    thunks: &mut HashMap<Path, Thunk>,
) -> Result<(), EngineError> {
    if let Some(resolved) = structural_lookup(path, args)? {
        emit_structural_override(path, resolved, thunks);
        return Ok(());
    }
    let mut indices: Vec<usize> = args
        .subpaths(path)
        .iter()
        .filter_map(|s| s.parse::<usize>().ok())
        .collect();
    indices.sort_unstable();

    if indices.is_empty() {
        if let Some(default) = &field.default {
            thunks.insert(path.clone(), Thunk::value(path.clone(), default.clone()));
        } else {
            thunks.insert(path.clone(), Thunk::value(path.clone(), ConcreteValue::Array(Vec::new())));
        }
        return Ok(());
    }

    let mut order = Vec::with_capacity(indices.len());
    for idx in indices {
        let child_path = path.join_index(idx);
        let mut child_field = elem.clone();
        child_field.name = idx.to_string();
        walk_field(&child_path, &child_field, args, thunks)?;
        order.push(idx.to_string());
    }
    let kwargs = order
        .iter()
        .map(|name| (name.clone(), crate::thunk::ParamRef(path.join(name))))
        .collect();
    thunks.insert(
        path.clone(),
        Thunk {
            path: path.clone(),
            kwargs,
            body: crate::thunk::ThunkBody::CollectArray(order),
        },
    );
    Ok(())
}

fn walk_tuple(
    path: &Path,
    field: &Field,
    elems: &[Field],
    args: &mut ArgumentMap,
    thunks: &mut HashMap<Path, Thunk>,
) -> Result<(), EngineError> {
    if let Some(resolved) = structural_lookup(path, args)? {
        emit_structural_override(path, resolved, thunks);
        return Ok(());
    }
    if elems.is_empty() {
        if let Some(default) = &field.default {
            thunks.insert(path.clone(), Thunk::value(path.clone(), default.clone()));
            return Ok(());
        }
    }
    let mut order = Vec::with_capacity(elems.len());
    for (idx, elem) in elems.iter().enumerate() {
        let child_path = path.join_index(idx);
        let mut child_field = elem.clone();
        child_field.name = idx.to_string();
        walk_field(&child_path, &child_field, args, thunks)?;
        order.push(idx.to_string());
    }
    let kwargs = order
        .iter()
        .map(|name| (name.clone(), crate::thunk::ParamRef(path.join(name))))
        .collect();
    thunks.insert(
        path.clone(),
        Thunk {
            path: path.clone(),
            kwargs,
            body: crate::thunk::ThunkBody::CollectTuple(order),
        },
    );
    Ok(())
}

fn walk_polymorphic(
    path: &Path,
    field: &Field,
    poly: &crate::schema::PolymorphicField,
    args: &mut ArgumentMap,
    thunks: &mut HashMap<Path, Thunk>,
) -> Result<(), EngineError> {
    match args.get(path) {
        Some(Resolved { value: ArgValue::Reference(target), .. }) => {
            thunks.insert(path.clone(), Thunk::identity(path.clone(), target));
            Ok(())
        }
        Some(Resolved { value: ArgValue::Computed(computed), .. }) => {
            thunks.insert(path.clone(), Thunk::computed(path.clone(), computed.sources, computed.compute));
            Ok(())
        }
        Some(Resolved { value: ArgValue::Concrete(value), .. }) => {
            thunks.insert(path.clone(), Thunk::value(path.clone(), value));
            Ok(())
        }
        Some(Resolved { value: ArgValue::Castable(token), .. }) if token == "disabled" => {
            resolve_default_subtype(path, field, poly, args, thunks)
        }
        Some(Resolved { value: ArgValue::Castable(token), .. }) => {
            let schema = poly.meta_factory.from_string(&token).map_err(|e| match e {
                crate::schema::FactoryError::UnknownSubtype { token, valid } => {
                    EngineError::UnknownSubtype { path: path.to_string(), token, valid }
                }
                crate::schema::FactoryError::MalformedFunctionRef { token, reason } => {
                    EngineError::CastError {
                        path: path.to_string(),
                        raw: token,
                        type_repr: "function".to_string(),
                        reason,
                    }
                }
            })?;
            walk_fields(path, &schema.fields, &schema.record_validators, args, thunks)
        }
        None => resolve_default_subtype(path, field, poly, args, thunks),
    }
}

fn resolve_default_subtype(
    path: &Path,
    field: &Field,
    poly: &crate::schema::PolymorphicField,
    args: &mut ArgumentMap,
    thunks: &mut HashMap<Path, Thunk>,
) -> Result<(), EngineError> {
    match poly.meta_factory.unspecified_factory() {
        Some(schema) => walk_fields(path, &schema.fields, &schema.record_validators, args, thunks),
        None => emit_absent(path, field, thunks),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use blueprint_types::{Layer, Type};

    use super::*;
    use crate::evaluator::evaluate;
    use crate::factory::SubclassMetaFactory;
    use crate::schema::PolymorphicField;

    fn path(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn layer_with(name: &str, entries: &[(&str, &str)]) -> Layer {
        let mut layer = Layer::new(name);
        for (k, v) in entries {
            layer.insert_qualified(path(k), ArgValue::castable(*v));
        }
        layer
    }

    #[test]
    fn test_basic_record_with_default() {
        let schema = RecordSchema::new(vec![
            Field::new("name", FieldKind::Scalar(Type::String)),
            Field::new("count", FieldKind::Scalar(Type::Integer)).with_default(ConcreteValue::Integer(2)),
        ]);
        let mut args = ArgumentMap::new(vec![layer_with("cli", &[("name", "test"), ("count", "3")])]);
        let thunks = walk(&schema, &mut args).unwrap();
        let value = evaluate(&thunks, &Path::root()).unwrap();
        assert_eq!(value.field("name").unwrap().as_str(), Some("test"));
        assert_eq!(value.field("count").unwrap().as_integer(), Some(3));
    }

    #[test]
    fn test_missing_required_field() {
        let schema = RecordSchema::new(vec![Field::new("name", FieldKind::Scalar(Type::String))]);
        let mut args = ArgumentMap::new(vec![layer_with("cli", &[])]);
        let err = walk(&schema, &mut args).unwrap_err();
        assert!(matches!(err, EngineError::MissingRequired { path } if path == "name"));
    }

    #[test]
    fn test_nested_record_with_wildcard() {
        let inner = RecordSchema::new(vec![Field::new("x", FieldKind::Scalar(Type::Integer))]);
        let schema = RecordSchema::new(vec![
            Field::new("a", FieldKind::Record(inner.clone())),
            Field::new("b", FieldKind::Record(inner)),
        ]);
        let mut wild = Layer::new("cli");
        wild.push_wildcard("...x", ArgValue::castable("7"));
        let mut args = ArgumentMap::new(vec![wild]);
        let thunks = walk(&schema, &mut args).unwrap();
        let value = evaluate(&thunks, &Path::root()).unwrap();
        assert_eq!(value.field("a").unwrap().field("x").unwrap().as_integer(), Some(7));
        assert_eq!(value.field("b").unwrap().field("x").unwrap().as_integer(), Some(7));
    }

    #[test]
    fn test_nested_record_qualified_overrides_wildcard() {
        let inner = RecordSchema::new(vec![Field::new("x", FieldKind::Scalar(Type::Integer))]);
        let schema = RecordSchema::new(vec![
            Field::new("a", FieldKind::Record(inner.clone())),
            Field::new("b", FieldKind::Record(inner)),
        ]);
        let mut layer = Layer::new("cli");
        layer.insert_qualified(path("a.x"), ArgValue::castable("1"));
        layer.push_wildcard("...x", ArgValue::castable("7"));
        let mut args = ArgumentMap::new(vec![layer]);
        let thunks = walk(&schema, &mut args).unwrap();
        let value = evaluate(&thunks, &Path::root()).unwrap();
        assert_eq!(value.field("a").unwrap().field("x").unwrap().as_integer(), Some(1));
        assert_eq!(value.field("b").unwrap().field("x").unwrap().as_integer(), Some(7));
    }

    #[test]
    fn test_reference_field() {
        let schema = RecordSchema::new(vec![
            Field::new("a", FieldKind::Scalar(Type::Integer)),
            Field::new("b", FieldKind::Scalar(Type::Integer)),
        ]);
        let mut layer = Layer::new("cli");
        layer.insert_qualified(path("a"), ArgValue::castable("5"));
        layer.insert_qualified(path("b"), ArgValue::reference(path("a")));
        let mut args = ArgumentMap::new(vec![layer]);
        let thunks = walk(&schema, &mut args).unwrap();
        let value = evaluate(&thunks, &Path::root()).unwrap();
        assert_eq!(value.field("a").unwrap().as_integer(), Some(5));
        assert_eq!(value.field("b").unwrap().as_integer(), Some(5));
    }

    #[test]
    fn test_reference_cycle_is_detected() {
        let schema = RecordSchema::new(vec![
            Field::new("a", FieldKind::Scalar(Type::Integer)),
            Field::new("b", FieldKind::Scalar(Type::Integer)),
        ]);
        let mut layer = Layer::new("cli");
        layer.insert_qualified(path("a"), ArgValue::reference(path("b")));
        layer.insert_qualified(path("b"), ArgValue::reference(path("a")));
        let mut args = ArgumentMap::new(vec![layer]);
        let thunks = walk(&schema, &mut args).unwrap();
        let err = evaluate(&thunks, &Path::root()).unwrap_err();
        assert!(matches!(err, EngineError::Cycle { .. }));
    }

    #[test]
    fn test_polymorphic_field_dispatch_and_default() {
        let a = Arc::new(RecordSchema::default());
        let b = Arc::new(RecordSchema::new(vec![Field::new("msg", FieldKind::Scalar(Type::String))]));
        let factory = SubclassMetaFactory::new(vec![("alpha".into(), a), ("beta".into(), b)]).with_default("alpha");
        let schema = RecordSchema::new(vec![Field::new(
            "handler",
            FieldKind::Polymorphic(PolymorphicField::new(Arc::new(factory))),
        )]);

        let mut layer = Layer::new("cli");
        layer.insert_qualified(path("handler"), ArgValue::castable("beta"));
        layer.insert_qualified(path("handler.msg"), ArgValue::castable("hi"));
        let mut args = ArgumentMap::new(vec![layer]);
        let thunks = walk(&schema, &mut args).unwrap();
        let value = evaluate(&thunks, &Path::root()).unwrap();
        assert_eq!(value.field("handler").unwrap().field("msg").unwrap().as_str(), Some("hi"));

        let mut args = ArgumentMap::new(vec![Layer::new("cli")]);
        let thunks = walk(&schema, &mut args).unwrap();
        let value = evaluate(&thunks, &Path::root()).unwrap();
        assert_eq!(value.field("handler").unwrap(), &ConcreteValue::Record(vec![]));
    }

    #[test]
    fn test_unknown_polymorphic_subtype() {
        let a = Arc::new(RecordSchema::default());
        let factory = SubclassMetaFactory::new(vec![("alpha".into(), a)]).with_default("alpha");
        let schema = RecordSchema::new(vec![Field::new(
            "handler",
            FieldKind::Polymorphic(PolymorphicField::new(Arc::new(factory))),
        )]);
        let mut layer = Layer::new("cli");
        layer.insert_qualified(path("handler"), ArgValue::castable("gamma"));
        let mut args = ArgumentMap::new(vec![layer]);
        let err = walk(&schema, &mut args).unwrap_err();
        assert!(matches!(err, EngineError::UnknownSubtype { .. }));
    }

    #[test]
    fn test_variadic_tuple() {
        let schema = RecordSchema::new(vec![Field::new(
            "coords",
            FieldKind::Tuple(vec![
                Field::new("0", FieldKind::Scalar(Type::Integer)),
                Field::new("1", FieldKind::Scalar(Type::Integer)),
                Field::new("2", FieldKind::Scalar(Type::String)),
            ]),
        )]);
        let mut layer = Layer::new("cli");
        layer.insert_qualified(path("coords.0"), ArgValue::castable("10"));
        layer.insert_qualified(path("coords.1"), ArgValue::castable("20"));
        layer.insert_qualified(path("coords.2"), ArgValue::castable("north"));
        let mut args = ArgumentMap::new(vec![layer]);
        let thunks = walk(&schema, &mut args).unwrap();
        let value = evaluate(&thunks, &Path::root()).unwrap();
        let coords = value.field("coords").unwrap();
        assert_eq!(
            coords,
            &ConcreteValue::Tuple(vec![
                ConcreteValue::Integer(10),
                ConcreteValue::Integer(20),
                ConcreteValue::String("north".into()),
            ])
        );
    }

    #[test]
    fn test_variadic_tuple_missing_index() {
        let schema = RecordSchema::new(vec![Field::new(
            "coords",
            FieldKind::Tuple(vec![
                Field::new("0", FieldKind::Scalar(Type::Integer)),
                Field::new("1", FieldKind::Scalar(Type::Integer)),
            ]),
        )]);
        let mut layer = Layer::new("cli");
        layer.insert_qualified(path("coords.0"), ArgValue::castable("10"));
        let mut args = ArgumentMap::new(vec![layer]);
        let err = walk(&schema, &mut args).unwrap_err();
        assert!(matches!(err, EngineError::MissingRequired { path } if path == "coords.1"));
    }

    #[test]
    fn test_empty_list_without_entries_yields_empty_array() {
        let schema = RecordSchema::new(vec![Field::new(
            "tags",
            FieldKind::List(Box::new(Field::new("elem", FieldKind::Scalar(Type::String)))),
        )]);
        let mut args = ArgumentMap::new(vec![Layer::new("cli")]);
        let thunks = walk(&schema, &mut args).unwrap();
        let value = evaluate(&thunks, &Path::root()).unwrap();
        assert_eq!(value.field("tags").unwrap(), &ConcreteValue::Array(vec![]));
    }
}
