use thiserror::Error;

use edmio_format::FormatError;
use edmio_store::StoreError;
use edmio_types::SchemaVersion;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("problem opening file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: FormatError,
    },

    #[error("file {path} has schema version {file}, newer than this build ({build})")]
    VersionMismatch {
        path: String,
        file: SchemaVersion,
        build: SchemaVersion,
    },

    #[error("event source is not open")]
    NotOpen,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("read error: {0}")]
    Read(#[from] FormatError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type SourceResult<T> = Result<T, SourceError>;
