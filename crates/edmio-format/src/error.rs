use thiserror::Error;

use edmio_store::StoreError;
use edmio_types::{SchemaVersion, TypeError};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid file magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("file schema version {file} is newer than this build ({build})")]
    VersionTooNew {
        file: SchemaVersion,
        build: SchemaVersion,
    },

    #[error("corrupt file at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("CRC32 mismatch in collection {collection} of event {event}")]
    CrcMismatch { collection: String, event: u64 },

    #[error("table of contents checksum mismatch")]
    ChecksumMismatch,

    #[error("event index {index} out of range (file has {count} events)")]
    EventOutOfRange { index: u64, count: u64 },

    #[error("collection already declared: {0}")]
    DuplicateCollection(String),

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("no schema declared for type {type_name} (collection {collection})")]
    MissingSchema {
        collection: String,
        type_name: String,
    },

    #[error("conflicting schema for type {0}")]
    SchemaConflict(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

pub type FormatResult<T> = Result<T, FormatError>;
