use std::slice::ChunksExact;

use serde::{Deserialize, Serialize};

use edmio_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// Whether a collection holds records or cross-references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    /// Plain POD records of the declared type.
    Data,
    /// `podio::ObjectID` records pointing into other collections.
    Relation,
}

/// One collection's raw records for one event.
///
/// Records are fixed-size and packed back to back in `data`. The vector is
/// produced fresh for every event and owned by that event's store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawDataVector {
    pub name: String,
    pub collection_id: u32,
    pub type_name: String,
    pub kind: CollectionKind,
    record_size: usize,
    data: Vec<u8>,
}

impl RawDataVector {
    /// Wrap packed record bytes, checking they split into whole records.
    pub fn new(
        name: impl Into<String>,
        collection_id: u32,
        type_name: impl Into<String>,
        kind: CollectionKind,
        record_size: usize,
        data: Vec<u8>,
    ) -> StoreResult<Self> {
        let name = name.into();
        if record_size == 0 {
            return Err(StoreError::ZeroRecordSize { collection: name });
        }
        if data.len() % record_size != 0 {
            return Err(StoreError::RaggedData {
                collection: name,
                len: data.len(),
                record_size,
            });
        }
        Ok(Self {
            name,
            collection_id,
            type_name: type_name.into(),
            kind,
            record_size,
            data,
        })
    }

    /// Size of one record in bytes.
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.len() / self.record_size
    }

    /// Returns `true` if the collection is empty for this event.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw packed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterate records in order.
    pub fn records(&self) -> ChunksExact<'_, u8> {
        self.data.chunks_exact(self.record_size)
    }

    /// Record at position `index`.
    pub fn record(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.record_size)?;
        self.data.get(start..start + self.record_size)
    }

    /// The data collection a relation collection belongs to.
    ///
    /// Relation collections are named `<parent>#<n>`.
    pub fn parent_name(&self) -> Option<&str> {
        match self.kind {
            CollectionKind::Relation => self.name.rsplit_once('#').map(|(parent, _)| parent),
            CollectionKind::Data => None,
        }
    }

    /// Decode the targets of a relation collection.
    pub fn targets(&self) -> StoreResult<Vec<ObjectId>> {
        if self.kind != CollectionKind::Relation {
            return Err(StoreError::NotRelation(self.name.clone()));
        }
        self.records()
            .map(|record| ObjectId::from_bytes(record).map_err(StoreError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(name: &str, ids: &[ObjectId]) -> RawDataVector {
        let data = ids.iter().flat_map(|id| id.to_bytes()).collect();
        RawDataVector::new(name, 9, "podio::ObjectID", CollectionKind::Relation, 8, data).unwrap()
    }

    #[test]
    fn records_split_evenly() {
        let raw = RawDataVector::new("Hits", 1, "t", CollectionKind::Data, 4, vec![0u8; 12]).unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw.records().count(), 3);
        assert_eq!(raw.record(2).map(<[u8]>::len), Some(4));
        assert!(raw.record(3).is_none());
    }

    #[test]
    fn ragged_data_rejected() {
        let err = RawDataVector::new("Hits", 1, "t", CollectionKind::Data, 4, vec![0u8; 10]).unwrap_err();
        assert!(matches!(err, StoreError::RaggedData { len: 10, record_size: 4, .. }));
    }

    #[test]
    fn zero_record_size_rejected() {
        let err = RawDataVector::new("Hits", 1, "t", CollectionKind::Data, 0, vec![]).unwrap_err();
        assert!(matches!(err, StoreError::ZeroRecordSize { .. }));
    }

    #[test]
    fn empty_collection() {
        let raw = RawDataVector::new("Hits", 1, "t", CollectionKind::Data, 4, vec![]).unwrap();
        assert!(raw.is_empty());
        assert_eq!(raw.len(), 0);
    }

    #[test]
    fn relation_parent_and_targets() {
        let ids = [ObjectId::new(2, 0), ObjectId::new(2, 5)];
        let rel = relation("SimTrackerHits#0", &ids);
        assert_eq!(rel.parent_name(), Some("SimTrackerHits"));
        assert_eq!(rel.targets().unwrap(), ids.to_vec());
    }

    #[test]
    fn targets_of_data_collection_fails() {
        let raw = RawDataVector::new("Hits", 1, "t", CollectionKind::Data, 8, vec![0u8; 8]).unwrap();
        assert!(raw.parent_name().is_none());
        assert!(matches!(raw.targets(), Err(StoreError::NotRelation(_))));
    }
}
