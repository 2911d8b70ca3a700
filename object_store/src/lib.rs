//! Access to snapshot artifacts.
//!
//! Artifacts are gzip-compressed protobuf messages. An [`ObjectStore`] hands out
//! decompressed bytes; [`StoredObject`] implementations turn them into typed records.

mod file;
mod mock;
mod objects;
mod raw;

#[doc(hidden)] // used by the `serialize_using_protobuf!` macro
pub mod _reexports {
    pub use crate::raw::BoxedError;
    pub use prost;
}

pub use self::{
    file::FileBackedObjectStore,
    mock::MockStore,
    objects::StoredObject,
    raw::{BoxedError, ObjectStore, ObjectStoreError, ObjectStoreFactory},
};
