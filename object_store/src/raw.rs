use std::{error, fmt, io, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{file::FileBackedObjectStore, mock::MockStore};

/// Boxed error type used for serialization errors.
pub type BoxedError = Box<dyn error::Error + Send + Sync>;

/// Errors during [`ObjectStore`] operations.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// An object with the specified key is not found.
    #[error("object `{key}` not found")]
    KeyNotFound { key: String },
    /// The object exists but cannot be read or written.
    #[error("I/O error accessing object `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    /// The stored bytes are not a valid gzip stream.
    #[error("object `{key}` is not a valid gzip stream: {source}")]
    Decompression {
        key: String,
        #[source]
        source: io::Error,
    },
    /// The decompressed bytes do not parse against the expected schema.
    #[error("object `{key}` does not match the expected schema: {source}")]
    SchemaMismatch {
        key: String,
        #[source]
        source: BoxedError,
    },
}

/// Functionality to fetch and store byte blobs from an object store.
///
/// The store is responsible for compression: [`Self::get_raw()`] always returns
/// the fully decompressed object and [`Self::put_raw()`] accepts uncompressed bytes.
#[async_trait]
pub trait ObjectStore: fmt::Debug + Send + Sync {
    /// Fetches the decompressed value for the given key.
    ///
    /// # Errors
    ///
    /// Returns an error if an object with the `key` does not exist, cannot be accessed
    /// or cannot be decompressed.
    async fn get_raw(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Stores a value, replacing the previous value for the key if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the insertion / replacement operation fails.
    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), ObjectStoreError>;
}

/// Factory of [`ObjectStore`]s.
#[derive(Debug)]
pub enum ObjectStoreFactory {
    /// Gzip-compressed files under the given root.
    FileBacked(PathBuf),
    /// In-memory store shared between all created instances.
    Mock(Arc<MockStore>),
}

impl ObjectStoreFactory {
    pub fn file_backed(base_dir: impl Into<PathBuf>) -> Self {
        Self::FileBacked(base_dir.into())
    }

    pub fn mock() -> Self {
        Self::Mock(Arc::new(MockStore::default()))
    }

    pub fn create_store(&self) -> Arc<dyn ObjectStore> {
        match self {
            Self::FileBacked(base_dir) => {
                olaos_logs::info!(
                    "Initialized file-backed object store at {}",
                    base_dir.display()
                );
                Arc::new(FileBackedObjectStore::new(base_dir.clone()))
            }
            Self::Mock(store) => store.clone(),
        }
    }
}
