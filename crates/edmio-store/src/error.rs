use edmio_types::TypeError;

/// Errors from event store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A collection declared a record size of zero.
    #[error("collection {collection} has zero-sized records")]
    ZeroRecordSize { collection: String },

    /// Raw bytes are not a whole number of records.
    #[error("collection {collection}: {len} bytes is not a multiple of record size {record_size}")]
    RaggedData {
        collection: String,
        len: usize,
        record_size: usize,
    },

    /// The raw record size disagrees with the registered schema.
    #[error("collection {collection} ({type_name}): schema record size {expected}, raw record size {actual}")]
    LayoutMismatch {
        collection: String,
        type_name: String,
        expected: usize,
        actual: usize,
    },

    /// A wrapper was pushed out of order for its collection.
    #[error("collection id {collection_id}: expected index {expected}, got {actual}")]
    NonSequentialIndex {
        collection_id: u32,
        expected: u32,
        actual: u32,
    },

    /// Two different layouts were registered under one type name.
    #[error("conflicting schema for type {0}")]
    SchemaConflict(String),

    /// Relation records were requested from a data collection.
    #[error("collection {0} is not a relation collection")]
    NotRelation(String),

    /// A record could not be decoded.
    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
