use edmio_types::ObjectId;

use crate::arena::ObjArena;
use crate::error::StoreResult;
use crate::obj::Obj;
use crate::raw::{CollectionKind, RawDataVector};

/// Everything decoded for exactly one event.
///
/// The store owns the event's raw data vectors, its relation vectors, and the
/// arena of wrapper objects materialized from the raw data. It is produced by
/// the column reader, filled by the materializer, and handed to the consuming
/// [`Event`](crate::Event), which drops or clears it when the event is done.
#[derive(Debug)]
pub struct EventStore {
    event_index: u64,
    data_vectors: Vec<RawDataVector>,
    relation_vectors: Vec<RawDataVector>,
    arena: ObjArena,
}

impl EventStore {
    /// Create an empty store for the event at `event_index` in its file.
    pub fn new(event_index: u64) -> Self {
        Self {
            event_index,
            data_vectors: Vec::new(),
            relation_vectors: Vec::new(),
            arena: ObjArena::new(),
        }
    }

    /// Position of this event in its file.
    pub fn event_index(&self) -> u64 {
        self.event_index
    }

    /// Serial of the wrapper arena; views carry it to find their store.
    pub fn serial(&self) -> u64 {
        self.arena.serial()
    }

    /// Add one raw collection, routed by its kind.
    pub fn push_raw(&mut self, raw: RawDataVector) {
        match raw.kind {
            CollectionKind::Data => self.data_vectors.push(raw),
            CollectionKind::Relation => self.relation_vectors.push(raw),
        }
    }

    pub fn data_vectors(&self) -> &[RawDataVector] {
        &self.data_vectors
    }

    pub fn relation_vectors(&self) -> &[RawDataVector] {
        &self.relation_vectors
    }

    /// A data collection by name.
    pub fn data_vector(&self, name: &str) -> Option<&RawDataVector> {
        self.data_vectors.iter().find(|dv| dv.name == name)
    }

    /// A relation collection by name (e.g. `"SimTrackerHits#0"`).
    pub fn relations(&self, name: &str) -> Option<&RawDataVector> {
        self.relation_vectors.iter().find(|rv| rv.name == name)
    }

    /// The raw vectors and the wrapper arena, borrowed together so the
    /// materializer can read one while filling the other.
    pub fn split_mut(&mut self) -> (&[RawDataVector], &mut ObjArena) {
        (&self.data_vectors, &mut self.arena)
    }

    /// Hand one wrapper to the store.
    pub fn push_obj(&mut self, obj: Obj) -> StoreResult<ObjectId> {
        self.arena.push(obj)
    }

    pub fn arena(&self) -> &ObjArena {
        &self.arena
    }

    /// Look up a wrapper by identity.
    pub fn get(&self, id: ObjectId) -> Option<&Obj> {
        self.arena.get(id)
    }

    /// Number of live wrappers.
    pub fn obj_count(&self) -> usize {
        self.arena.len()
    }

    /// Release every wrapper now instead of at drop.
    ///
    /// Idempotent: a second call releases nothing and returns 0. Raw vectors
    /// are kept; they are released with the store itself.
    pub fn clear(&mut self) -> usize {
        self.arena.clear()
    }

    pub fn is_cleared(&self) -> bool {
        self.arena.is_cleared()
    }
}
