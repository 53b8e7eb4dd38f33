use std::collections::BTreeMap;

use tracing::warn;

use edmio_types::ObjectId;

use crate::error::StoreResult;
use crate::obj::{Obj, ObjRef, ObjView};
use crate::store::EventStore;

/// The consuming event context.
///
/// Owns the view sequences inserted by the materializer (keyed by collection
/// name), the event's store once attached, and the header fields. Downstream
/// code reads collections here; it never owns wrappers.
#[derive(Debug, Default)]
pub struct Event {
    run_number: i32,
    event_number: i32,
    collections: BTreeMap<String, Vec<ObjView>>,
    store: Option<EventStore>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_number(&self) -> i32 {
        self.run_number
    }

    pub fn set_run_number(&mut self, run_number: i32) {
        self.run_number = run_number;
    }

    pub fn event_number(&self) -> i32 {
        self.event_number
    }

    pub fn set_event_number(&mut self, event_number: i32) {
        self.event_number = event_number;
    }

    /// Take ownership of a view sequence under `name`.
    ///
    /// A sequence already present under the same name is replaced and returned.
    pub fn insert(&mut self, name: impl Into<String>, views: Vec<ObjView>) -> Option<Vec<ObjView>> {
        let name = name.into();
        let previous = self.collections.insert(name.clone(), views);
        if previous.is_some() {
            warn!(collection = %name, "replacing collection already present in event");
        }
        previous
    }

    /// Views of a collection.
    pub fn get(&self, name: &str) -> Option<&[ObjView]> {
        self.collections.get(name).map(Vec::as_slice)
    }

    /// Remove a collection's views, handing ownership to the caller.
    pub fn take(&mut self, name: &str) -> Option<Vec<ObjView>> {
        self.collections.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Names of the collections present, sorted.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    /// Attach the event's store; returns any store attached before.
    pub fn attach_store(&mut self, store: EventStore) -> Option<EventStore> {
        self.store.replace(store)
    }

    pub fn store(&self) -> Option<&EventStore> {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> Option<&mut EventStore> {
        self.store.as_mut()
    }

    pub fn take_store(&mut self) -> Option<EventStore> {
        self.store.take()
    }

    /// Resolve a view through the attached store.
    pub fn resolve<'a>(&'a self, view: &'a ObjView) -> Option<ObjRef<'a>> {
        view.resolve(self.store.as_ref()?)
    }

    /// Resolve a view of a collection by position.
    pub fn resolve_at(&self, name: &str, index: usize) -> Option<ObjRef<'_>> {
        let view = self.get(name)?.get(index)?;
        self.resolve(view)
    }

    /// Look up any wrapper in the attached store by identity.
    pub fn lookup(&self, id: ObjectId) -> Option<&Obj> {
        self.store.as_ref()?.get(id)
    }

    /// Follow a relation collection: resolve each target to its wrapper.
    ///
    /// Unset targets (negative index on disk) and targets whose collection was
    /// not read come back as `None`. Returns `Ok(None)` when there is no store
    /// or no such relation, and an error when the relation records are not
    /// object identities.
    pub fn follow(&self, relation: &str) -> StoreResult<Option<Vec<Option<&Obj>>>> {
        let Some(store) = self.store.as_ref() else {
            return Ok(None);
        };
        let Some(raw) = store.relations(relation) else {
            return Ok(None);
        };
        let targets = raw.targets().inspect_err(|e| {
            warn!(relation, error = %e, "malformed relation collection");
        })?;
        Ok(Some(
            targets
                .into_iter()
                .map(|id| if id.is_unset() { None } else { store.get(id) })
                .collect(),
        ))
    }

    /// Drop all views and the store, ready for the next event.
    pub fn reset(&mut self) {
        self.collections.clear();
        self.store = None;
        self.run_number = 0;
        self.event_number = 0;
    }
}
