use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use edmio_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::obj::Obj;

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Arena of wrapper objects for one event.
///
/// Wrappers are addressed by `(collection_id, index)`. Each collection's
/// indices must arrive in order starting at 0, which makes the pair unique by
/// construction. [`ObjArena::clear`] is the only place wrappers are released
/// apart from drop. Clearing also retires the serial, so views created before
/// the clear never resolve again.
pub struct ObjArena {
    serial: u64,
    objs: Vec<Obj>,
    /// collection id -> positions in `objs`, by index.
    slots: HashMap<u32, Vec<usize>>,
    cleared: bool,
}

impl ObjArena {
    pub fn new() -> Self {
        Self {
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            objs: Vec::new(),
            slots: HashMap::new(),
            cleared: false,
        }
    }

    /// Process-unique serial of this arena.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Take ownership of a wrapper.
    ///
    /// Fails if the wrapper's index is not the next index of its collection.
    pub fn push(&mut self, obj: Obj) -> StoreResult<ObjectId> {
        let id = obj.id();
        let positions = self.slots.entry(id.collection_id).or_default();
        let expected = positions.len() as u32;
        if id.index != expected {
            return Err(StoreError::NonSequentialIndex {
                collection_id: id.collection_id,
                expected,
                actual: id.index,
            });
        }
        positions.push(self.objs.len());
        self.objs.push(obj);
        self.cleared = false;
        Ok(id)
    }

    /// Look up a wrapper by identity.
    pub fn get(&self, id: ObjectId) -> Option<&Obj> {
        let position = *self.slots.get(&id.collection_id)?.get(id.index as usize)?;
        self.objs.get(position)
    }

    /// Number of wrappers in a collection.
    pub fn collection_len(&self, collection_id: u32) -> usize {
        self.slots.get(&collection_id).map_or(0, Vec::len)
    }

    /// Total number of live wrappers.
    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    /// Iterate live wrappers in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &Obj> {
        self.objs.iter()
    }

    /// Release every wrapper. Returns how many were released.
    ///
    /// Calling this again releases nothing and returns 0.
    pub fn clear(&mut self) -> usize {
        if self.cleared && self.objs.is_empty() {
            return 0;
        }
        let released = self.objs.len();
        self.objs = Vec::new();
        self.slots = HashMap::new();
        self.cleared = true;
        debug!(serial = self.serial, released, "arena cleared");
        self.serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
        released
    }

    /// Returns `true` once [`ObjArena::clear`] has run and nothing was pushed since.
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }
}

impl Default for ObjArena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjArena")
            .field("serial", &self.serial)
            .field("obj_count", &self.objs.len())
            .field("collections", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(collection_id: u32, index: u32) -> Obj {
        Obj::new(ObjectId::new(collection_id, index), &index.to_le_bytes())
    }

    #[test]
    fn serials_are_unique() {
        assert_ne!(ObjArena::new().serial(), ObjArena::new().serial());
    }

    #[test]
    fn push_and_get() {
        let mut arena = ObjArena::new();
        arena.push(obj(1, 0)).unwrap();
        arena.push(obj(1, 1)).unwrap();
        let found = arena.get(ObjectId::new(1, 1)).unwrap();
        assert_eq!(found.data(), &1u32.to_le_bytes());
        assert!(arena.get(ObjectId::new(1, 2)).is_none());
        assert!(arena.get(ObjectId::new(2, 0)).is_none());
    }

    #[test]
    fn interleaved_collections_resolve() {
        let mut arena = ObjArena::new();
        arena.push(obj(1, 0)).unwrap();
        arena.push(obj(2, 0)).unwrap();
        arena.push(obj(1, 1)).unwrap();
        assert_eq!(arena.get(ObjectId::new(1, 1)).unwrap().id(), ObjectId::new(1, 1));
        assert_eq!(arena.collection_len(1), 2);
        assert_eq!(arena.collection_len(2), 1);
        assert_eq!(arena.collection_len(3), 0);
    }

    #[test]
    fn out_of_order_push_rejected() {
        let mut arena = ObjArena::new();
        arena.push(obj(1, 0)).unwrap();
        let err = arena.push(obj(1, 5)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::NonSequentialIndex { collection_id: 1, expected: 1, actual: 5 }
        ));
    }

    #[test]
    fn duplicate_identity_rejected() {
        let mut arena = ObjArena::new();
        arena.push(obj(4, 0)).unwrap();
        assert!(arena.push(obj(4, 0)).is_err());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn clear_twice_is_noop() {
        let mut arena = ObjArena::new();
        arena.push(obj(1, 0)).unwrap();
        arena.push(obj(1, 1)).unwrap();
        assert_eq!(arena.clear(), 2);
        assert!(arena.is_cleared());
        assert_eq!(arena.clear(), 0);
        assert!(arena.is_empty());
        assert!(arena.get(ObjectId::new(1, 0)).is_none());
    }

    #[test]
    fn clear_on_empty_arena() {
        let mut arena = ObjArena::new();
        assert_eq!(arena.clear(), 0);
        assert_eq!(arena.clear(), 0);
    }

    #[test]
    fn clear_retires_serial_once() {
        let mut arena = ObjArena::new();
        let before = arena.serial();
        arena.push(obj(1, 0)).unwrap();
        arena.clear();
        let after = arena.serial();
        assert_ne!(before, after);
        arena.clear();
        assert_eq!(arena.serial(), after);
    }

    #[test]
    fn push_after_clear_restarts_indices() {
        let mut arena = ObjArena::new();
        arena.push(obj(1, 0)).unwrap();
        arena.clear();
        arena.push(obj(1, 0)).unwrap();
        assert!(!arena.is_cleared());
        assert_eq!(arena.len(), 1);
    }
}
