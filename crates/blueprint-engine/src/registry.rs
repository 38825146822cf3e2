//! Process-wide schema registry (§4.7, §5).
//!
//! Backs `MetaFactory::registered_factories()` for the built-in `Standard` and
//! `Subclass` realizations. Registration is expected at process start
//! (schema-module self-registration via an `inventory`-style macro is out of
//! scope); reads happen during every construction and must observe every
//! write that happened-before them, which an `RwLock` gives for free without
//! requiring a lock-free structure.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::schema::RecordSchema;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("schema '{namespace}:{name}' is already registered with a different definition")]
    Conflict { namespace: String, name: String },
    #[error("short name '{name}' is already registered with a different definition")]
    ShortNameConflict { name: String },
}

/// Maps `(namespace, name) -> schema` and `short_name -> schema`.
///
/// Re-registering the exact same [`Arc<RecordSchema>`] (by pointer identity)
/// under a key it already holds is idempotent; registering a *different*
/// `Arc` under an occupied key is a [`RegistryError::Conflict`]. Structural
/// equality isn't available here because a `RecordSchema`'s mungers and
/// validators are boxed closures, so pointer identity is the only cheap,
/// correct notion of "the same definition" the registry can check.
#[derive(Default)]
pub struct SchemaRegistry {
    by_namespace_name: RwLock<HashMap<(String, String), Arc<RecordSchema>>>,
    by_short_name: RwLock<HashMap<String, Arc<RecordSchema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry::default()
    }

    #[tracing::instrument(level = "debug", skip(self, schema))]
    pub fn register(
        &self,
        namespace: &str,
        name: &str,
        schema: Arc<RecordSchema>,
    ) -> Result<(), RegistryError> {
        let mut map = self.by_namespace_name.write().expect("registry lock poisoned");
        let key = (namespace.to_string(), name.to_string());
        match map.get(&key) {
            Some(existing) if Arc::ptr_eq(existing, &schema) => Ok(()),
            Some(_) => Err(RegistryError::Conflict {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            None => {
                tracing::debug!(namespace, name, "registered schema module");
                map.insert(key, schema);
                Ok(())
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self, schema))]
    pub fn register_short_name(
        &self,
        short_name: &str,
        schema: Arc<RecordSchema>,
    ) -> Result<(), RegistryError> {
        let mut map = self.by_short_name.write().expect("registry lock poisoned");
        match map.get(short_name) {
            Some(existing) if Arc::ptr_eq(existing, &schema) => Ok(()),
            Some(_) => Err(RegistryError::ShortNameConflict {
                name: short_name.to_string(),
            }),
            None => {
                map.insert(short_name.to_string(), schema);
                Ok(())
            }
        }
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<Arc<RecordSchema>> {
        self.by_namespace_name
            .read()
            .expect("registry lock poisoned")
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn get_by_short_name(&self, name: &str) -> Option<Arc<RecordSchema>> {
        self.by_short_name
            .read()
            .expect("registry lock poisoned")
            .get(name)
            .cloned()
    }

    /// All `(namespace, name)` pairs currently registered, for help text and
    /// `UnknownSubtype` suggestion lists.
    pub fn namespace_names(&self) -> Vec<(String, String)> {
        let mut keys: Vec<_> = self
            .by_namespace_name
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecordSchema;

    fn empty_schema() -> Arc<RecordSchema> {
        Arc::new(RecordSchema::default())
    }

    #[test]
    fn test_register_and_get() {
        let registry = SchemaRegistry::new();
        let schema = empty_schema();
        registry.register("handlers", "alpha", schema.clone()).unwrap();
        assert!(Arc::ptr_eq(&registry.get("handlers", "alpha").unwrap(), &schema));
    }

    #[test]
    fn test_idempotent_reregistration() {
        let registry = SchemaRegistry::new();
        let schema = empty_schema();
        registry.register("handlers", "alpha", schema.clone()).unwrap();
        registry.register("handlers", "alpha", schema).unwrap();
    }

    #[test]
    fn test_conflicting_reregistration_is_error() {
        let registry = SchemaRegistry::new();
        registry.register("handlers", "alpha", empty_schema()).unwrap();
        let err = registry.register("handlers", "alpha", empty_schema()).unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { .. }));
    }

    #[test]
    fn test_get_missing_is_none() {
        let registry = SchemaRegistry::new();
        assert!(registry.get("handlers", "missing").is_none());
    }

    #[test]
    fn test_short_name_registration() {
        let registry = SchemaRegistry::new();
        let schema = empty_schema();
        registry.register_short_name("alpha", schema.clone()).unwrap();
        assert!(Arc::ptr_eq(&registry.get_by_short_name("alpha").unwrap(), &schema));
    }
}
