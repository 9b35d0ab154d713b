use crate::ByteStream;
use crate::ObjectStore;
use crate::StorageError;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream as AwsByteStream;
use futures::StreamExt;
use futures::TryStreamExt;

/// S3-compatible object storage adapter (spec §6: storage endpoint/creds
/// come from the environment; `aws-config` resolves them the standard way).
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub async fn connect(bucket: impl Into<String>, endpoint: Option<&str>) -> Self {
        let mut loader = aws_config::from_env();
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;
        let client = Client::new(&shared_config);
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_stream(
        &self,
        key: &str,
        content_type: &str,
        body: ByteStream,
    ) -> Result<(), StorageError> {
        // put_object takes a single body; a true streaming multipart upload
        // would avoid this buffering but isn't worth the complexity here.
        // Callers (the pipeline worker) still only ever hold one stream at a
        // time, so this crate is the only place bytes get materialized.
        let bytes: Vec<u8> = body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(AwsByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn get_stream(&self, key: &str) -> Result<ByteStream, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        let stream = output
            .body
            .map(|result| result.map_err(|e| StorageError::Transport(e.to_string())));
        Ok(Box::pin(stream))
    }
}
