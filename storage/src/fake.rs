use crate::ByteStream;
use crate::ObjectStore;
use crate::StorageError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::TryStreamExt;
use futures::stream;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// In-memory [`ObjectStore`] for tests.
#[derive(Default)]
pub struct FakeStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_bytes(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn put_stream(
        &self,
        key: &str,
        _content_type: &str,
        body: ByteStream,
    ) -> Result<(), StorageError> {
        let bytes: Vec<u8> = body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;
        self.objects
            .lock()
            .await
            .insert(key.to_string(), Bytes::from(bytes));
        Ok(())
    }

    async fn get_stream(&self, key: &str) -> Result<ByteStream, StorageError> {
        let bytes = self
            .get_bytes(key)
            .await
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(Box::pin(stream::once(async move { Ok(bytes) })))
    }
}
