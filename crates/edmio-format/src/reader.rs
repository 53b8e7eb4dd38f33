use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::{debug, info};

use edmio_store::{CollectionKind, EventStore, RawDataVector};
use edmio_types::{RecordSchema, SchemaVersion, BUILD_VERSION};

use crate::error::{FormatError, FormatResult};
use crate::header::{FileHeader, HEADER_LEN, TRAILER_LEN};
use crate::toc::{ChunkRef, CollectionDesc, TableOfContents};

/// Random-access reader over a memory-mapped `.edm` file.
///
/// Only the header and table of contents are decoded on open. Chunks are
/// decompressed per event and only for enabled collections.
pub struct ColumnReader {
    path: PathBuf,
    mmap: Mmap,
    header: FileHeader,
    toc: TableOfContents,
    record_sizes: Vec<usize>,
    enabled: Vec<bool>,
}

impl ColumnReader {
    /// Open and validate a file.
    ///
    /// The schema version is checked right after the magic; a file newer than
    /// this build fails with [`FormatError::VersionTooNew`] before the table of
    /// contents is touched.
    pub fn open(path: impl AsRef<Path>) -> FormatResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        if len < (HEADER_LEN + TRAILER_LEN) as u64 {
            return Err(FormatError::Corrupt {
                offset: 0,
                reason: format!("file too short: {len} bytes"),
            });
        }
        // SAFETY: the file is opened read-only and never written through the map.
        let mmap = unsafe { Mmap::map(&file)? };

        let version = FileHeader::peek_version(&mmap)?;
        if version.is_newer_than(&BUILD_VERSION) {
            return Err(FormatError::VersionTooNew {
                file: version,
                build: BUILD_VERSION,
            });
        }
        let header = FileHeader::parse(&mmap)?;

        let toc_start = header.toc_offset;
        let toc_end = toc_start
            .checked_add(header.toc_len)
            .filter(|end| {
                toc_start >= HEADER_LEN as u64
                    && end.checked_add(TRAILER_LEN as u64).is_some_and(|e| e <= len)
            })
            .ok_or_else(|| FormatError::Corrupt {
                offset: toc_start,
                reason: "table of contents outside file".into(),
            })?;
        let toc_bytes = &mmap[toc_start as usize..toc_end as usize];
        if crc32fast::hash(toc_bytes) != header.toc_crc32 {
            return Err(FormatError::Corrupt {
                offset: toc_start,
                reason: "table of contents CRC32 mismatch".into(),
            });
        }
        let trailer = &mmap[toc_end as usize..toc_end as usize + TRAILER_LEN];
        if blake3::hash(toc_bytes).as_bytes() != trailer {
            return Err(FormatError::ChecksumMismatch);
        }

        let toc = TableOfContents::from_bytes(toc_bytes, toc_start)?;
        if toc.events.len() as u64 != header.event_count {
            return Err(FormatError::Corrupt {
                offset: toc_start,
                reason: format!(
                    "header declares {} events, table of contents has {}",
                    header.event_count,
                    toc.events.len()
                ),
            });
        }

        let record_sizes = toc
            .collections
            .iter()
            .map(|c| toc.schema(&c.type_name).map_or(0, RecordSchema::record_size))
            .collect();
        let enabled = vec![true; toc.collections.len()];

        info!(
            path = %path.display(),
            version = %header.version,
            events = header.event_count,
            collections = toc.collections.len(),
            "opened file"
        );
        Ok(Self {
            path,
            mmap,
            header,
            toc,
            record_sizes,
            enabled,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Schema version the file was written with.
    pub fn version(&self) -> SchemaVersion {
        self.header.version
    }

    pub fn num_events(&self) -> u64 {
        self.header.event_count
    }

    /// Schemas declared in the file.
    pub fn schemas(&self) -> &[RecordSchema] {
        &self.toc.schemas
    }

    /// Every collection in the file, enabled or not.
    pub fn collections(&self) -> &[CollectionDesc] {
        &self.toc.collections
    }

    /// `(name, type)` of every collection.
    pub fn list_collections(&self) -> Vec<(&str, &str)> {
        self.pairs(|_| true)
    }

    /// `(name, type)` of every data collection.
    pub fn data_collections(&self) -> Vec<(&str, &str)> {
        self.pairs(|c| c.kind == CollectionKind::Data)
    }

    /// `(name, type)` of every relation collection.
    pub fn relation_collections(&self) -> Vec<(&str, &str)> {
        self.pairs(|c| c.kind == CollectionKind::Relation)
    }

    fn pairs(&self, keep: impl Fn(&CollectionDesc) -> bool) -> Vec<(&str, &str)> {
        self.toc
            .collections
            .iter()
            .filter(|c| keep(c))
            .map(|c| (c.name.as_str(), c.type_name.as_str()))
            .collect()
    }

    /// Enable or disable reading of the collections matching `pattern`.
    ///
    /// `pattern` is an exact name or a `*` glob. A data collection's pattern
    /// also covers its relation collections (`<name>#<n>`). Returns the number
    /// of collections matched; 0 means nothing matched.
    pub fn set_collection_enabled(&mut self, pattern: &str, enabled: bool) -> usize {
        let mut matched = 0;
        for (desc, flag) in self.toc.collections.iter().zip(self.enabled.iter_mut()) {
            if collection_matches(pattern, desc) {
                *flag = enabled;
                matched += 1;
            }
        }
        debug!(pattern, enabled, matched, "collection status changed");
        matched
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.toc
            .collections
            .iter()
            .position(|c| c.name == name)
            .is_some_and(|i| self.enabled[i])
    }

    /// Names of the collections that will be read.
    pub fn enabled_collections(&self) -> Vec<&str> {
        self.toc
            .collections
            .iter()
            .zip(&self.enabled)
            .filter(|(_, on)| **on)
            .map(|(c, _)| c.name.as_str())
            .collect()
    }

    /// Decode the enabled collections of one event into a new store.
    pub fn get_event(&self, index: u64) -> FormatResult<EventStore> {
        let row = self
            .toc
            .events
            .get(index as usize)
            .ok_or(FormatError::EventOutOfRange {
                index,
                count: self.header.event_count,
            })?;

        let mut store = EventStore::new(index);
        for (c, desc) in self.toc.collections.iter().enumerate() {
            if !self.enabled[c] {
                continue;
            }
            let expected = usize::try_from(row[c].count)
                .ok()
                .and_then(|count| count.checked_mul(self.record_sizes[c]))
                .ok_or_else(|| FormatError::Corrupt {
                    offset: row[c].offset,
                    reason: format!("collection {} declares {} records", desc.name, row[c].count),
                })?;
            let data = self.read_chunk(index, desc, &row[c], expected)?;
            let raw = RawDataVector::new(
                desc.name.clone(),
                desc.id,
                desc.type_name.clone(),
                desc.kind,
                self.record_sizes[c],
                data,
            )?;
            if raw.len() as u64 != row[c].count {
                return Err(FormatError::Corrupt {
                    offset: row[c].offset,
                    reason: format!(
                        "collection {} declares {} records, chunk holds {}",
                        desc.name,
                        row[c].count,
                        raw.len()
                    ),
                });
            }
            store.push_raw(raw);
        }
        debug!(
            event = index,
            data = store.data_vectors().len(),
            relations = store.relation_vectors().len(),
            "read event"
        );
        Ok(store)
    }

    fn read_chunk(
        &self,
        event: u64,
        desc: &CollectionDesc,
        chunk: &ChunkRef,
        expected_len: usize,
    ) -> FormatResult<Vec<u8>> {
        let start = chunk.offset;
        let end = start
            .checked_add(chunk.compressed_len)
            .filter(|end| start >= HEADER_LEN as u64 && *end <= self.header.toc_offset)
            .ok_or_else(|| FormatError::Corrupt {
                offset: start,
                reason: format!("chunk of {} outside data region", desc.name),
            })?;
        let compressed = &self.mmap[start as usize..end as usize];
        if crc32fast::hash(compressed) != chunk.crc32 {
            return Err(FormatError::CrcMismatch {
                collection: desc.name.clone(),
                event,
            });
        }
        decompress_chunk(compressed, expected_len)
    }
}

/// Decompress one chunk, refusing output larger than `expected_len`.
fn decompress_chunk(compressed: &[u8], expected_len: usize) -> FormatResult<Vec<u8>> {
    zstd::bulk::decompress(compressed, expected_len)
        .map_err(|e| FormatError::DecompressionFailed(e.to_string()))
}

impl std::fmt::Debug for ColumnReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnReader")
            .field("path", &self.path)
            .field("version", &self.header.version)
            .field("events", &self.header.event_count)
            .field("collections", &self.toc.collections.len())
            .finish()
    }
}

fn collection_matches(pattern: &str, desc: &CollectionDesc) -> bool {
    if glob_match(pattern, &desc.name) {
        return true;
    }
    match desc.kind {
        CollectionKind::Relation => desc
            .name
            .rsplit_once('#')
            .is_some_and(|(parent, _)| glob_match(pattern, parent)),
        CollectionKind::Data => false,
    }
}

/// Match `text` against a pattern where `*` matches any run of characters.
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '*')
}
