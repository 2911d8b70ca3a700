//! Stored objects.

use ola_types::{
    proto,
    snapshots::{SnapshotFactoryDependencies, SnapshotStorageLogsChunk},
};

use crate::raw::{BoxedError, ObjectStore, ObjectStoreError};

/// Object that can be stored in an [`ObjectStore`].
pub trait StoredObject: Sized {
    /// Logical unique key for the object. The lifetime param allows defining keys
    /// that borrow data.
    type Key<'a>: Copy;

    /// Encodes the object key to a string.
    fn encode_key(key: Self::Key<'_>) -> String;

    /// Serializes a value to a blob.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn serialize(&self) -> Result<Vec<u8>, BoxedError>;

    /// Deserializes a value from the blob.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    fn deserialize(bytes: Vec<u8>) -> Result<Self, BoxedError>;
}

/// Derives [`StoredObject::serialize()`] and [`StoredObject::deserialize()`] through
/// the given `prost` message type, which must be convertible from `&Self`, and into
/// which `Self` must be convertible with `TryFrom`.
#[macro_export]
macro_rules! serialize_using_protobuf {
    ($proto:ty) => {
        fn serialize(
            &self,
        ) -> std::result::Result<std::vec::Vec<u8>, $crate::_reexports::BoxedError> {
            let message = <$proto>::from(self);
            Ok($crate::_reexports::prost::Message::encode_to_vec(&message))
        }

        fn deserialize(
            bytes: std::vec::Vec<u8>,
        ) -> std::result::Result<Self, $crate::_reexports::BoxedError> {
            let message =
                <$proto as $crate::_reexports::prost::Message>::decode(bytes.as_slice())?;
            Ok(<Self as std::convert::TryFrom<$proto>>::try_from(message)?)
        }
    };
}

impl StoredObject for SnapshotFactoryDependencies {
    /// Path of the artifact relative to the store root.
    type Key<'a> = &'a str;

    fn encode_key(key: Self::Key<'_>) -> String {
        key.to_owned()
    }

    serialize_using_protobuf!(proto::SnapshotFactoryDependencies);
}

impl StoredObject for SnapshotStorageLogsChunk {
    type Key<'a> = &'a str;

    fn encode_key(key: Self::Key<'_>) -> String {
        key.to_owned()
    }

    serialize_using_protobuf!(proto::SnapshotStorageLogsChunk);
}

impl dyn ObjectStore + '_ {
    /// Fetches the value for the given key. Decoding starts only after the object
    /// has been fully decompressed.
    ///
    /// # Errors
    ///
    /// Returns an error if an object with the `key` does not exist, cannot be accessed,
    /// or cannot be deserialized.
    pub async fn get<V: StoredObject>(&self, key: V::Key<'_>) -> Result<V, ObjectStoreError> {
        let key = V::encode_key(key);
        let bytes = self.get_raw(&key).await?;
        V::deserialize(bytes).map_err(|source| ObjectStoreError::SchemaMismatch { key, source })
    }

    /// Stores the value associating it with the key. If the key already exists,
    /// the value is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the insertion / replacement operation fails.
    pub async fn put<V: StoredObject>(
        &self,
        key: V::Key<'_>,
        value: &V,
    ) -> Result<String, ObjectStoreError> {
        let key = V::encode_key(key);
        let bytes = value
            .serialize()
            .map_err(|source| ObjectStoreError::SchemaMismatch {
                key: key.clone(),
                source,
            })?;
        self.put_raw(&key, bytes).await?;
        Ok(key)
    }
}
