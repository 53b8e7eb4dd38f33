use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identity of one record within one event.
///
/// An `ObjectId` pairs the numeric id of the collection a record belongs to
/// with the record's position in that collection. Within one event the pair is
/// unique, and it is the only way relation collections refer to other records.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    pub collection_id: u32,
    pub index: u32,
}

impl ObjectId {
    /// Encoded size in bytes.
    pub const SIZE: usize = 8;

    /// Index value a relation record uses for "no target" (`-1` as `i32`).
    pub const UNSET_INDEX: u32 = u32::MAX;

    pub const fn new(collection_id: u32, index: u32) -> Self {
        Self {
            collection_id,
            index,
        }
    }

    /// First identity of a collection (index 0).
    pub const fn first(collection_id: u32) -> Self {
        Self::new(collection_id, 0)
    }

    /// The identity that follows this one in the same collection.
    pub const fn next(self) -> Self {
        Self::new(self.collection_id, self.index + 1)
    }

    /// Little-endian encoding matching the `podio::ObjectID` record layout:
    /// index, then collection id.
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.index.to_le_bytes());
        out[4..].copy_from_slice(&self.collection_id.to_le_bytes());
        out
    }

    /// Returns `true` if this id is a relation placeholder with no target.
    pub fn is_unset(&self) -> bool {
        self.index == Self::UNSET_INDEX
    }

    /// Parse the encoding produced by [`ObjectId::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() != Self::SIZE {
            return Err(TypeError::InvalidLength {
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }
        let index = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let collection_id = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(Self::new(collection_id, index))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({}:{})", self.collection_id, self.index)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.collection_id, self.index)
    }
}

impl From<(u32, u32)> for ObjectId {
    fn from((collection_id, index): (u32, u32)) -> Self {
        Self::new(collection_id, index)
    }
}
