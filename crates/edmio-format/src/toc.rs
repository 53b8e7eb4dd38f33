use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use edmio_store::CollectionKind;
use edmio_types::RecordSchema;

use crate::error::{FormatError, FormatResult};

/// One collection declared in a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDesc {
    /// Collection id, stable for the life of the file.
    pub id: u32,
    pub name: String,
    pub type_name: String,
    pub kind: CollectionKind,
}

/// Location of one compressed (event, collection) chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
    pub offset: u64,
    pub compressed_len: u64,
    pub crc32: u32,
    /// Number of records in the chunk.
    pub count: u64,
}

/// Everything needed to locate and interpret the chunks of a file.
///
/// `events[e][c]` is the chunk of collection `collections[c]` for event `e`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableOfContents {
    pub schemas: Vec<RecordSchema>,
    pub collections: Vec<CollectionDesc>,
    pub events: Vec<Vec<ChunkRef>>,
}

impl TableOfContents {
    pub fn to_bytes(&self) -> FormatResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| FormatError::Serialization(e.to_string()))
    }

    /// Decode and check internal consistency.
    pub fn from_bytes(data: &[u8], offset: u64) -> FormatResult<Self> {
        let toc: Self = bincode::deserialize(data).map_err(|e| FormatError::Corrupt {
            offset,
            reason: format!("table of contents: {e}"),
        })?;
        toc.validate(offset)?;
        Ok(toc)
    }

    pub fn schema(&self, type_name: &str) -> Option<&RecordSchema> {
        self.schemas.iter().find(|s| s.type_name == type_name)
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionDesc> {
        self.collections.iter().find(|c| c.name == name)
    }

    fn validate(&self, offset: u64) -> FormatResult<()> {
        let corrupt = |reason: String| FormatError::Corrupt { offset, reason };

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for desc in &self.collections {
            if !ids.insert(desc.id) {
                return Err(corrupt(format!("duplicate collection id {}", desc.id)));
            }
            if !names.insert(desc.name.as_str()) {
                return Err(corrupt(format!("duplicate collection name {}", desc.name)));
            }
            let schema = self.schema(&desc.type_name).ok_or_else(|| FormatError::MissingSchema {
                collection: desc.name.clone(),
                type_name: desc.type_name.clone(),
            })?;
            if schema.record_size() == 0 {
                return Err(corrupt(format!("type {} has zero-sized records", desc.type_name)));
            }
        }
        for (e, chunks) in self.events.iter().enumerate() {
            if chunks.len() != self.collections.len() {
                return Err(corrupt(format!(
                    "event {e} has {} chunks for {} collections",
                    chunks.len(),
                    self.collections.len()
                )));
            }
        }
        Ok(())
    }
}
