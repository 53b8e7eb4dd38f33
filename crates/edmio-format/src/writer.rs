use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use edmio_store::{CollectionKind, StoreError};
use edmio_types::{ObjectId, RecordSchema, SchemaVersion, BUILD_VERSION, OBJECT_ID_TYPE};

use crate::error::{FormatError, FormatResult};
use crate::header::{FileHeader, HEADER_LEN};
use crate::toc::{ChunkRef, CollectionDesc, TableOfContents};

/// Default zstd level for chunks.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Result of writing a file.
#[derive(Clone, Debug)]
pub struct FileSummary {
    pub path: PathBuf,
    pub event_count: u64,
    pub collection_count: usize,
    pub checksum: [u8; 32],
}

/// Packed records of one event, keyed by collection id.
#[derive(Clone, Debug, Default)]
pub struct EventRecords {
    chunks: HashMap<u32, Vec<u8>>,
}

impl EventRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append already-encoded records to a collection.
    pub fn append(&mut self, collection_id: u32, records: &[u8]) {
        self.chunks
            .entry(collection_id)
            .or_default()
            .extend_from_slice(records);
    }

    /// Append relation targets to a relation collection.
    pub fn append_targets(&mut self, collection_id: u32, targets: &[ObjectId]) {
        let buf = self.chunks.entry(collection_id).or_default();
        for target in targets {
            buf.extend_from_slice(&target.to_bytes());
        }
    }

    fn get(&self, collection_id: u32) -> &[u8] {
        self.chunks.get(&collection_id).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Streams events into a `.edm` file.
///
/// The header is written as zeros on create and patched by [`ColumnWriter::finish`];
/// a writer dropped without finishing leaves a file readers reject.
pub struct ColumnWriter {
    path: PathBuf,
    out: BufWriter<File>,
    version: SchemaVersion,
    level: i32,
    offset: u64,
    toc: TableOfContents,
}

impl ColumnWriter {
    /// Create a file at the build schema version.
    pub fn create(path: impl AsRef<Path>) -> FormatResult<Self> {
        Self::with_version(path, BUILD_VERSION)
    }

    /// Create a file stamped with an explicit schema version.
    pub fn with_version(path: impl AsRef<Path>, version: SchemaVersion) -> FormatResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut out = BufWriter::new(File::create(&path)?);
        out.write_all(&[0u8; HEADER_LEN])?;
        Ok(Self {
            path,
            out,
            version,
            level: DEFAULT_COMPRESSION_LEVEL,
            offset: HEADER_LEN as u64,
            toc: TableOfContents::default(),
        })
    }

    pub fn set_compression_level(&mut self, level: i32) {
        self.level = level;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of events written so far.
    pub fn event_count(&self) -> u64 {
        self.toc.events.len() as u64
    }

    /// Declare a schema without a collection. Identical re-declarations are
    /// accepted; a different layout under the same name is not.
    pub fn register_schema(&mut self, schema: &RecordSchema) -> FormatResult<()> {
        match self.toc.schema(&schema.type_name) {
            Some(existing) if existing == schema => Ok(()),
            Some(_) => Err(FormatError::SchemaConflict(schema.type_name.clone())),
            None => {
                self.toc.schemas.push(schema.clone());
                Ok(())
            }
        }
    }

    /// Declare a data collection and return its collection id.
    pub fn declare_collection(&mut self, name: &str, schema: &RecordSchema) -> FormatResult<u32> {
        self.register_schema(schema)?;
        self.declare(name, &schema.type_name, CollectionKind::Data)
    }

    /// Declare the next relation collection of `parent`, named `<parent>#<n>`.
    pub fn declare_relation(&mut self, parent: &str) -> FormatResult<u32> {
        match self.toc.collection(parent) {
            Some(desc) if desc.kind == CollectionKind::Data => {}
            _ => return Err(FormatError::UnknownCollection(parent.to_string())),
        }
        let prefix = format!("{parent}#");
        let n = self
            .toc
            .collections
            .iter()
            .filter(|c| c.name.starts_with(&prefix))
            .count();
        let object_id = edmio_types::builtin_schemas()
            .into_iter()
            .find(|s| s.type_name == OBJECT_ID_TYPE)
            .ok_or_else(|| FormatError::UnknownCollection(OBJECT_ID_TYPE.to_string()))?;
        self.register_schema(&object_id)?;
        self.declare(&format!("{prefix}{n}"), OBJECT_ID_TYPE, CollectionKind::Relation)
    }

    fn declare(&mut self, name: &str, type_name: &str, kind: CollectionKind) -> FormatResult<u32> {
        if !self.toc.events.is_empty() {
            return Err(FormatError::Corrupt {
                offset: self.offset,
                reason: format!("collection {name} declared after events were written"),
            });
        }
        if self.toc.collection(name).is_some() {
            return Err(FormatError::DuplicateCollection(name.to_string()));
        }
        let id = self.toc.collections.len() as u32 + 1;
        self.toc.collections.push(CollectionDesc {
            id,
            name: name.to_string(),
            type_name: type_name.to_string(),
            kind,
        });
        debug!(collection = name, id, type_name, "declared collection");
        Ok(id)
    }

    /// Compress and write one event. Declared collections missing from
    /// `records` are written empty.
    pub fn write_event(&mut self, records: &EventRecords) -> FormatResult<()> {
        for id in records.chunks.keys() {
            if !self.toc.collections.iter().any(|c| c.id == *id) {
                return Err(FormatError::UnknownCollection(format!("id {id}")));
            }
        }

        let mut sizes = Vec::with_capacity(self.toc.collections.len());
        for desc in &self.toc.collections {
            let len = records.get(desc.id).len();
            let record_size = self
                .toc
                .schema(&desc.type_name)
                .map(RecordSchema::record_size)
                .unwrap_or_default();
            if record_size == 0 || len % record_size != 0 {
                return Err(FormatError::Store(StoreError::RaggedData {
                    collection: desc.name.clone(),
                    len,
                    record_size,
                }));
            }
            sizes.push(record_size);
        }

        let mut row = Vec::with_capacity(sizes.len());
        for (desc, record_size) in self.toc.collections.iter().zip(sizes) {
            let data = records.get(desc.id);
            let compressed = zstd::encode_all(data, self.level)
                .map_err(|e| FormatError::CompressionFailed(e.to_string()))?;
            self.out.write_all(&compressed)?;
            row.push(ChunkRef {
                offset: self.offset,
                compressed_len: compressed.len() as u64,
                crc32: crc32fast::hash(&compressed),
                count: (data.len() / record_size) as u64,
            });
            self.offset += compressed.len() as u64;
        }
        self.toc.events.push(row);
        Ok(())
    }

    /// Write the table of contents and trailer, then patch the header.
    pub fn finish(mut self) -> FormatResult<FileSummary> {
        let toc_bytes = self.toc.to_bytes()?;
        let checksum = *blake3::hash(&toc_bytes).as_bytes();
        self.out.write_all(&toc_bytes)?;
        self.out.write_all(&checksum)?;

        let header = FileHeader {
            version: self.version,
            flags: 0,
            event_count: self.toc.events.len() as u64,
            toc_offset: self.offset,
            toc_len: toc_bytes.len() as u64,
            toc_crc32: crc32fast::hash(&toc_bytes),
        };
        self.out.seek(SeekFrom::Start(0))?;
        self.out.write_all(&header.to_bytes())?;
        self.out.flush()?;

        info!(
            path = %self.path.display(),
            events = header.event_count,
            collections = self.toc.collections.len(),
            "file written"
        );
        Ok(FileSummary {
            path: self.path,
            event_count: header.event_count,
            collection_count: self.toc.collections.len(),
            checksum,
        })
    }
}
