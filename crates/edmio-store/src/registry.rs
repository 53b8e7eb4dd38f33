use std::collections::HashMap;
use std::sync::Arc;

use edmio_types::{builtin_schemas, RecordSchema};

use crate::error::{StoreError, StoreResult};

/// Maps declared type names to record schema descriptors.
///
/// The materializer picks a collection's descriptor here by the type name the
/// file declared for it. Descriptors are shared (`Arc`) with every view made
/// from them.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<RecordSchema>>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with the built-in EDM schemas.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for schema in builtin_schemas() {
            registry
                .schemas
                .insert(schema.type_name.clone(), Arc::new(schema));
        }
        registry
    }

    /// Register a descriptor.
    ///
    /// Registering an identical layout again is a no-op; a different layout
    /// under an existing name is a conflict.
    pub fn register(&mut self, schema: RecordSchema) -> StoreResult<Arc<RecordSchema>> {
        if let Some(existing) = self.schemas.get(&schema.type_name) {
            if **existing != schema {
                return Err(StoreError::SchemaConflict(schema.type_name));
            }
            return Ok(Arc::clone(existing));
        }
        let name = schema.type_name.clone();
        let schema = Arc::new(schema);
        self.schemas.insert(name, Arc::clone(&schema));
        Ok(schema)
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<RecordSchema>> {
        self.schemas.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
