use std::sync::Arc;

use tracing::{debug, warn};

use edmio_types::{ObjectId, RecordSchema};

use crate::arena::ObjArena;
use crate::error::{StoreError, StoreResult};
use crate::event::Event;
use crate::obj::{Obj, ObjView};
use crate::raw::RawDataVector;
use crate::registry::SchemaRegistry;
use crate::store::EventStore;

/// Materialize one raw collection.
///
/// Allocates one wrapper per record into `arena`, identities starting at
/// `(raw.collection_id, 0)`, and returns one view per wrapper in record order.
/// The views are the caller's to hand on; the wrappers stay in the arena.
pub fn materialize(
    raw: &RawDataVector,
    schema: &Arc<RecordSchema>,
    arena: &mut ObjArena,
) -> StoreResult<Vec<ObjView>> {
    if raw.record_size() != schema.record_size() {
        return Err(StoreError::LayoutMismatch {
            collection: raw.name.clone(),
            type_name: schema.type_name.clone(),
            expected: schema.record_size(),
            actual: raw.record_size(),
        });
    }

    let serial = arena.serial();
    let mut id = ObjectId::first(raw.collection_id);
    let mut views = Vec::with_capacity(raw.len());
    for record in raw.records() {
        arena.push(Obj::new(id, record))?;
        views.push(ObjView::new(id, serial, Arc::clone(schema)));
        id = id.next();
    }
    Ok(views)
}

/// Counts from one event's materialization pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    /// Collections inserted into the event.
    pub collections: usize,
    /// Wrappers allocated.
    pub objects: usize,
    /// Collections skipped because their type has no registered schema.
    pub skipped: Vec<String>,
}

/// Drives [`materialize`] over every data collection of an event.
#[derive(Clone, Debug, Default)]
pub struct Materializer {
    registry: SchemaRegistry,
}

impl Materializer {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.registry
    }

    /// Materialize every data vector in `store` and insert the views into
    /// `event` under each collection's name.
    ///
    /// The store is not attached to the event here; the caller does that once
    /// materialization is complete.
    pub fn materialize_event(
        &self,
        store: &mut EventStore,
        event: &mut Event,
    ) -> StoreResult<MaterializeSummary> {
        let mut summary = MaterializeSummary::default();
        let (raws, arena) = store.split_mut();
        for raw in raws {
            let Some(schema) = self.registry.get(&raw.type_name) else {
                warn!(collection = %raw.name, type_name = %raw.type_name, "no schema registered; collection skipped");
                summary.skipped.push(raw.name.clone());
                continue;
            };
            let views = materialize(raw, schema, arena)?;
            debug!(collection = %raw.name, count = views.len(), "materialized collection");
            summary.objects += views.len();
            summary.collections += 1;
            event.insert(raw.name.clone(), views);
        }
        Ok(summary)
    }
}
