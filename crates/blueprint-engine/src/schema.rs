//! The schema data model (§3, §4.4): the shape the walker recurses over.
//!
//! `blueprint_types::Type` stays a pure, self-recursive algebra so it can
//! live in the dependency-free `blueprint-types` crate (a `Type::Array`
//! contains only more `Type`s). A schema field's declared shape is richer
//! than that: it may recurse into a nested *record*, whose fields in turn
//! carry mungers, validators, and defaults — and a record can only be
//! expressed here, in `blueprint-engine`, without creating a dependency
//! cycle back into `blueprint-types`.

use std::fmt;
use std::sync::Arc;

use blueprint_types::{ConcreteValue, Type};

use blueprint_validation::{FieldValidator, Munger, RecordValidator};

/// One field of a [`RecordSchema`], a tuple index, or a map-schema key.
#[derive(Clone)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub default: Option<ConcreteValue>,
    pub mungers: Vec<Munger>,
    pub validators: Vec<FieldValidator>,
    pub doc: Option<String>,
    /// Overrides the derived required-ness (§4.4's map-schema "required
    /// flag", independent of whether a default is present). `None` means
    /// "derive from `default`/`kind`": a field is required iff it has no
    /// default and (for `Polymorphic`) no unspecified factory.
    pub required: Option<bool>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("mungers", &self.mungers.len())
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Field {
            name: name.into(),
            kind,
            default: None,
            mungers: Vec::new(),
            validators: Vec::new(),
            doc: None,
            required: None,
        }
    }

    pub fn with_default(mut self, default: ConcreteValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Whether this field must be supplied (directly or via default) for
    /// construction to succeed.
    pub fn is_required(&self) -> bool {
        if let Some(required) = self.required {
            return required;
        }
        if self.default.is_some() {
            return false;
        }
        if let FieldKind::Polymorphic(poly) = &self.kind {
            return poly.meta_factory.unspecified_factory().is_none();
        }
        true
    }
}

/// The declared shape of a [`Field`]. Mirrors §3's "Schema" node: record,
/// list, map-schema, or scalar leaf — plus the polymorphic case §4.4
/// resolves before recursing into the chosen subtype's `Record`.
#[derive(Clone)]
pub enum FieldKind {
    /// A leaf cast via the type algebra (§4.6); covers `array<T>`/`map<K,V>`
    /// and friends when populated from a single token.
    Scalar(Type),
    Record(RecordSchema),
    /// A homogeneous sequence whose elements are full schema nodes,
    /// discovered via `ArgumentMap::subpaths` (§4.4 "List / variadic").
    List(Box<Field>),
    /// A fixed-arity heterogeneous sequence; each index carries its own
    /// `Field` (named `"0"`, `"1"`, ...).
    Tuple(Vec<Field>),
    /// Named keys, each with its own type and required flag (§4.4
    /// "Map-schema").
    MapSchema(Vec<Field>),
    Polymorphic(PolymorphicField),
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(t) => write!(f, "Scalar({t})"),
            FieldKind::Record(r) => write!(f, "Record({} fields)", r.fields.len()),
            FieldKind::List(elem) => write!(f, "List({elem:?})"),
            FieldKind::Tuple(fields) => write!(f, "Tuple({} fields)", fields.len()),
            FieldKind::MapSchema(fields) => write!(f, "MapSchema({} keys)", fields.len()),
            FieldKind::Polymorphic(_) => write!(f, "Polymorphic"),
        }
    }
}

/// An ordered set of fields forming a record (§3).
#[derive(Clone, Default, Debug)]
pub struct RecordSchema {
    pub fields: Vec<Field>,
    pub record_validators: Vec<RecordValidator>,
}

impl RecordSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        RecordSchema {
            fields,
            record_validators: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Errors raised while resolving a polymorphic field's concrete subtype.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FactoryError {
    #[error("unknown subtype '{token}'; valid: {}", valid.join(", "))]
    UnknownSubtype { token: String, valid: Vec<String> },
    #[error("malformed function reference '{token}': {reason}")]
    MalformedFunctionRef { token: String, reason: String },
}

/// The strategy object a polymorphic field uses to pick its concrete subtype
/// (§4.7).
pub trait MetaFactory: Send + Sync {
    /// The subtype used when the field's own path carries no token.
    fn unspecified_factory(&self) -> Option<Arc<RecordSchema>>;

    /// Resolves a token found at the field's own path (e.g. `handler=beta`)
    /// to a concrete subtype.
    fn from_string(&self, token: &str) -> Result<Arc<RecordSchema>, FactoryError>;

    /// All subtypes known to this factory, by name, for help text and
    /// `UnknownSubtype` suggestion lists.
    fn registered_factories(&self) -> Vec<(String, Arc<RecordSchema>)>;
}

/// A polymorphic field: the walker resolves `meta_factory` to a concrete
/// `RecordSchema` before recursing into its children (I4).
#[derive(Clone)]
pub struct PolymorphicField {
    pub meta_factory: Arc<dyn MetaFactory>,
}

impl PolymorphicField {
    pub fn new(meta_factory: Arc<dyn MetaFactory>) -> Self {
        PolymorphicField { meta_factory }
    }
}
