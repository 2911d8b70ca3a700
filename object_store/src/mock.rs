//! Mock implementation of [`ObjectStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::raw::{ObjectStore, ObjectStoreError};

/// In-memory store; values are kept uncompressed.
#[derive(Debug, Default)]
pub struct MockStore {
    inner: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn get_raw(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let lock = self.inner.lock().await;
        lock.get(key)
            .cloned()
            .ok_or_else(|| ObjectStoreError::KeyNotFound {
                key: key.to_owned(),
            })
    }

    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), ObjectStoreError> {
        let mut lock = self.inner.lock().await;
        lock.insert(key.to_owned(), value);
        Ok(())
    }
}
