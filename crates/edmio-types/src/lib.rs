//! Foundation types for edmio.
//!
//! This crate provides the identity, versioning, and record-layout types used
//! throughout edmio. Every other edmio crate depends on `edmio-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Identity of one record within one event: collection id + index
//! - [`SchemaVersion`] -- `(major, minor, patch)` version of the on-disk schema
//! - [`RecordSchema`] -- Field layout of a fixed-size POD record type
//! - [`Value`] -- A decoded field value

pub mod builtin;
pub mod error;
pub mod object;
pub mod schema;
pub mod version;

pub use builtin::{builtin_schemas, EVENT_HEADER_TYPE, OBJECT_ID_TYPE};
pub use error::TypeError;
pub use object::ObjectId;
pub use schema::{FieldDef, FieldKind, RecordSchema, Value};
pub use version::{SchemaVersion, BUILD_VERSION};
