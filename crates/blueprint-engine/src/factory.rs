//! Built-in [`MetaFactory`] realizations (§4.7 a/b/c).

use std::collections::BTreeMap;
use std::sync::Arc;

use blueprint_types::{ConcreteValue, Type};

use crate::registry::SchemaRegistry;
use crate::schema::{Field, FactoryError, FieldKind, MetaFactory, RecordSchema};

/// (a) **Standard**: namespace lookup against the process registry, with
/// aliases and a qualified `module:attr` form.
///
/// `from_string` first checks `aliases`, then tries the token directly as a
/// short name in `namespace`, falling back to a `namespace:name` split when
/// the token itself contains a colon (the "qualified" form).
pub struct StandardMetaFactory {
    registry: Arc<SchemaRegistry>,
    namespace: String,
    aliases: BTreeMap<String, String>,
    default_name: Option<String>,
}

impl StandardMetaFactory {
    pub fn new(registry: Arc<SchemaRegistry>, namespace: impl Into<String>) -> Self {
        StandardMetaFactory {
            registry,
            namespace: namespace.into(),
            aliases: BTreeMap::new(),
            default_name: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }

    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    fn resolve_name(&self, token: &str) -> (String, String) {
        if let Some((namespace, name)) = token.split_once(':') {
            (namespace.to_string(), name.to_string())
        } else {
            let resolved = self.aliases.get(token).cloned().unwrap_or_else(|| token.to_string());
            (self.namespace.clone(), resolved)
        }
    }
}

impl MetaFactory for StandardMetaFactory {
    fn unspecified_factory(&self) -> Option<Arc<RecordSchema>> {
        let name = self.default_name.as_ref()?;
        self.registry.get(&self.namespace, name)
    }

    fn from_string(&self, token: &str) -> Result<Arc<RecordSchema>, FactoryError> {
        let (namespace, name) = self.resolve_name(token);
        self.registry
            .get(&namespace, &name)
            .ok_or_else(|| FactoryError::UnknownSubtype {
                token: token.to_string(),
                valid: self.registered_factories().into_iter().map(|(n, _)| n).collect(),
            })
    }

    fn registered_factories(&self) -> Vec<(String, Arc<RecordSchema>)> {
        self.registry
            .namespace_names()
            .into_iter()
            .filter(|(ns, _)| ns == &self.namespace)
            .filter_map(|(ns, name)| self.registry.get(&ns, &name).map(|s| (name, s)))
            .collect()
    }
}

/// (b) **Subclass**: a closed, explicitly-enumerated set of subtypes chosen
/// by a discriminator token, rather than an open namespace lookup. The
/// discriminator values and their schemas are supplied up front (the process
/// of discovering "modules implementing a given behavior" is itself a
/// compile-time / declarative-DSL concern, out of scope per §1).
pub struct SubclassMetaFactory {
    variants: Vec<(String, Arc<RecordSchema>)>,
    default_index: Option<usize>,
}

impl SubclassMetaFactory {
    pub fn new(variants: Vec<(String, Arc<RecordSchema>)>) -> Self {
        SubclassMetaFactory {
            variants,
            default_index: None,
        }
    }

    pub fn with_default(mut self, name: &str) -> Self {
        self.default_index = self.variants.iter().position(|(n, _)| n == name);
        self
    }
}

impl MetaFactory for SubclassMetaFactory {
    fn unspecified_factory(&self) -> Option<Arc<RecordSchema>> {
        self.default_index.map(|i| self.variants[i].1.clone())
    }

    fn from_string(&self, token: &str) -> Result<Arc<RecordSchema>, FactoryError> {
        self.variants
            .iter()
            .find(|(n, _)| n == token)
            .map(|(_, s)| s.clone())
            .ok_or_else(|| FactoryError::UnknownSubtype {
                token: token.to_string(),
                valid: self.variants.iter().map(|(n, _)| n.clone()).collect(),
            })
    }

    fn registered_factories(&self) -> Vec<(String, Arc<RecordSchema>)> {
        self.variants.clone()
    }
}

/// A parsed `module:name/arity` or bare `name/arity` function reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    pub module: Option<String>,
    pub name: String,
    pub arity: usize,
}

impl FunctionRef {
    pub fn parse(token: &str, default_module: Option<&str>) -> Result<FunctionRef, FactoryError> {
        let (qualifier, rest) = match token.split_once(':') {
            Some((module, rest)) => (Some(module.to_string()), rest),
            None => (default_module.map(str::to_string), token),
        };
        let (name, arity_str) = rest.split_once('/').ok_or_else(|| FactoryError::MalformedFunctionRef {
            token: token.to_string(),
            reason: "expected 'name/arity'".to_string(),
        })?;
        let arity = arity_str.parse::<usize>().map_err(|_| FactoryError::MalformedFunctionRef {
            token: token.to_string(),
            reason: format!("'{arity_str}' is not a valid arity"),
        })?;
        if name.is_empty() {
            return Err(FactoryError::MalformedFunctionRef {
                token: token.to_string(),
                reason: "function name is empty".to_string(),
            });
        }
        Ok(FunctionRef {
            module: qualifier,
            name: name.to_string(),
            arity,
        })
    }

    pub fn canonical(&self) -> String {
        match &self.module {
            Some(m) => format!("{m}:{}/{}", self.name, self.arity),
            None => format!("{}/{}", self.name, self.arity),
        }
    }
}

/// (c) **Function**: resolves a callable reference via `module:name/arity`
/// (or bare `name/arity` against `default_module`). The selected subtype is
/// a single-field record carrying the parsed reference as its `value` field,
/// so downstream walking treats it uniformly with record/tuple/map-schema
/// subtypes.
pub struct FunctionMetaFactory {
    default_module: Option<String>,
    arity: Option<usize>,
}

impl FunctionMetaFactory {
    pub fn new(default_module: Option<String>, arity: Option<usize>) -> Self {
        FunctionMetaFactory { default_module, arity }
    }

    fn schema_for(&self, reference: FunctionRef) -> Arc<RecordSchema> {
        let field = Field::new("value", FieldKind::Scalar(Type::Function(self.arity)))
            .with_default(ConcreteValue::String(reference.canonical()));
        Arc::new(RecordSchema::new(vec![field]))
    }
}

impl MetaFactory for FunctionMetaFactory {
    fn unspecified_factory(&self) -> Option<Arc<RecordSchema>> {
        None
    }

    fn from_string(&self, token: &str) -> Result<Arc<RecordSchema>, FactoryError> {
        let reference = FunctionRef::parse(token, self.default_module.as_deref())?;
        if let Some(expected) = self.arity {
            if reference.arity != expected {
                return Err(FactoryError::MalformedFunctionRef {
                    token: token.to_string(),
                    reason: format!("expected arity {expected}, got {}", reference.arity),
                });
            }
        }
        Ok(self.schema_for(reference))
    }

    fn registered_factories(&self) -> Vec<(String, Arc<RecordSchema>)> {
        Vec::new()
    }
}
