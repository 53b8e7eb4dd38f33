//! Per-event object storage for edmio.
//!
//! An [`EventStore`] is an arena holding everything decoded for exactly one
//! event: the raw data vectors read from the file, the relation vectors, and
//! one wrapper [`Obj`] per raw record. Consumers never own wrappers. They hold
//! [`ObjView`] handles, which address a wrapper by its
//! [`ObjectId`](edmio_types::ObjectId) and resolve through the store.
//!
//! # Tiers
//!
//! - **Wrapper tier** ([`Obj`]) -- owned by the store, released in bulk by
//!   [`EventStore::clear`] or when the store is dropped.
//! - **View tier** ([`ObjView`]) -- owned by the consuming [`Event`]; dropping a
//!   view never touches the wrapper it addresses.
//!
//! # Design Rules
//!
//! 1. Within one collection, indices start at 0 and increase by 1.
//! 2. `(collection_id, index)` is unique within one event.
//! 3. Relations resolve by id lookup, never by pointer.
//! 4. A view resolved against a cleared or foreign store yields `None`.
//! 5. A store has a single writer; there is no internal locking.

pub mod arena;
pub mod error;
pub mod event;
pub mod materialize;
pub mod obj;
pub mod raw;
pub mod registry;
pub mod store;

pub use arena::ObjArena;
pub use error::{StoreError, StoreResult};
pub use event::Event;
pub use materialize::{materialize, MaterializeSummary, Materializer};
pub use obj::{Obj, ObjRef, ObjView};
pub use raw::{CollectionKind, RawDataVector};
pub use registry::SchemaRegistry;
pub use store::EventStore;
