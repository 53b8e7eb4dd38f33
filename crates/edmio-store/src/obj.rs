use std::fmt;
use std::sync::Arc;

use edmio_types::{ObjectId, RecordSchema, Value};

use crate::store::EventStore;

/// Wrapper-tier object: one raw record bound to its identity.
///
/// Every `Obj` is a separate heap allocation owned by an [`EventStore`].
#[derive(Clone, PartialEq, Eq)]
pub struct Obj {
    id: ObjectId,
    data: Box<[u8]>,
}

impl Obj {
    /// Copy a raw record into a new wrapper.
    pub fn new(id: ObjectId, record: &[u8]) -> Self {
        Self {
            id,
            data: record.into(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The record bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Obj")
            .field("id", &self.id)
            .field("len", &self.data.len())
            .finish()
    }
}

/// View-tier handle over one wrapper.
///
/// A view is an identity plus the schema needed to interpret the record. It
/// does not own or keep alive the wrapper: it resolves through the store that
/// created it, and only that store.
#[derive(Clone)]
pub struct ObjView {
    id: ObjectId,
    store_serial: u64,
    schema: Arc<RecordSchema>,
}

impl ObjView {
    pub(crate) fn new(id: ObjectId, store_serial: u64, schema: Arc<RecordSchema>) -> Self {
        Self {
            id,
            store_serial,
            schema,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Serial of the store this view was materialized from.
    pub fn store_serial(&self) -> u64 {
        self.store_serial
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        &self.schema.type_name
    }

    /// Resolve against a store.
    ///
    /// Returns `None` if `store` is not the store this view came from, or if the
    /// store has been cleared.
    pub fn resolve<'a>(&'a self, store: &'a EventStore) -> Option<ObjRef<'a>> {
        if store.serial() != self.store_serial {
            return None;
        }
        store.get(self.id).map(|obj| ObjRef::new(obj, &self.schema))
    }
}

impl fmt::Debug for ObjView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjView")
            .field("id", &self.id)
            .field("type", &self.schema.type_name)
            .finish()
    }
}

/// A resolved view: borrowed wrapper plus its schema, with typed accessors.
#[derive(Clone, Copy, Debug)]
pub struct ObjRef<'a> {
    obj: &'a Obj,
    schema: &'a RecordSchema,
}

impl<'a> ObjRef<'a> {
    pub(crate) fn new(obj: &'a Obj, schema: &'a RecordSchema) -> Self {
        Self { obj, schema }
    }

    pub fn id(&self) -> ObjectId {
        self.obj.id
    }

    pub fn obj(&self) -> &'a Obj {
        self.obj
    }

    pub fn type_name(&self) -> &'a str {
        &self.schema.type_name
    }

    /// Decode a field by name.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.schema.decode_field(self.obj.data(), field)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field)?.as_i64()
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field)?.as_f64()
    }

    pub fn get_vec3(&self, field: &str) -> Option<[f64; 3]> {
        self.get(field)?.as_vec3()
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> Vec<(&'a str, Value)> {
        self.schema.decode_all(self.obj.data()).unwrap_or_default()
    }
}
