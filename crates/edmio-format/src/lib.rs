//! Columnar event file format for edmio.
//!
//! An `.edm` file stores one zstd-compressed, CRC-checked chunk per
//! (event, collection), followed by a table of contents and a BLAKE3 trailer.
//! Readers memory-map the file and decompress only the collections they have
//! enabled, one event at a time.
//!
//! # Architecture
//!
//! - **Header** (48 bytes): magic, schema version, event count, TOC location
//! - **Chunks**: packed little-endian records, zstd-compressed
//! - **Table of contents**: bincode-encoded schemas, collections, chunk refs
//! - **ColumnWriter**: declares collections and streams events to disk
//! - **ColumnReader**: version-gated, projection-aware random access

pub mod error;
pub mod header;
pub mod reader;
pub mod sample;
pub mod table;
pub mod toc;
pub mod writer;

pub use error::{FormatError, FormatResult};
pub use header::{FileHeader, HEADER_LEN, MAGIC, TRAILER_LEN};
pub use reader::ColumnReader;
pub use sample::{write_sample, SampleSpec, HEADER_COLLECTION, HIT_COLLECTION, PARTICLE_COLLECTION};
pub use table::{collection_table, render_table};
pub use toc::{ChunkRef, CollectionDesc, TableOfContents};
pub use writer::{ColumnWriter, EventRecords, FileSummary, DEFAULT_COMPRESSION_LEVEL};
