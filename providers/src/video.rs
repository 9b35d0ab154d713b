use crate::ProviderError;
use crate::http_client;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use serenity_core::DurationSeconds;
use std::fmt;

pub type VideoStream = BoxStream<'static, Result<Bytes, ProviderError>>;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VideoJobId(pub String);

impl fmt::Display for VideoJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoPoll {
    Processing,
    Completed { download_uri: String },
    Failed { error: String },
}

#[async_trait]
pub trait VideoPort: Send + Sync {
    async fn start(
        &self,
        prompt: &str,
        duration: DurationSeconds,
    ) -> Result<VideoJobId, ProviderError>;

    async fn poll(&self, job_id: &VideoJobId) -> Result<VideoPoll, ProviderError>;

    /// Requires the job to be in the `completed` state; otherwise fails
    /// with a permanent `InvalidState` error (spec §4.5).
    async fn fetch(&self, job_id: &VideoJobId) -> Result<VideoStream, ProviderError>;
}

#[derive(serde::Serialize)]
struct StartRequest<'a> {
    prompt: &'a str,
    duration_seconds: u32,
}

#[derive(serde::Deserialize)]
struct StartResponse {
    job_id: String,
}

#[derive(serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
enum PollResponse {
    Processing,
    Completed { download_uri: String },
    Failed { error: String },
}

pub struct HttpVideoProvider {
    client: reqwest::Client,
    poll_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpVideoProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(crate::GENERATE_TIMEOUT)?,
            poll_client: http_client(crate::POLL_TIMEOUT)?,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl VideoPort for HttpVideoProvider {
    async fn start(
        &self,
        prompt: &str,
        duration: DurationSeconds,
    ) -> Result<VideoJobId, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/videos", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&StartRequest {
                prompt,
                duration_seconds: duration.as_u32(),
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::transient(format!(
                "video provider start returned {}",
                response.status()
            )));
        }
        let parsed: StartResponse = response.json().await?;
        Ok(VideoJobId(parsed.job_id))
    }

    async fn poll(&self, job_id: &VideoJobId) -> Result<VideoPoll, ProviderError> {
        let response = self
            .poll_client
            .get(format!("{}/v1/videos/{}", self.base_url, job_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::transient(format!(
                "video provider poll returned {}",
                response.status()
            )));
        }
        let parsed: PollResponse = response.json().await?;
        Ok(match parsed {
            PollResponse::Processing => VideoPoll::Processing,
            PollResponse::Completed { download_uri } => VideoPoll::Completed { download_uri },
            PollResponse::Failed { error } => VideoPoll::Failed { error },
        })
    }

    async fn fetch(&self, job_id: &VideoJobId) -> Result<VideoStream, ProviderError> {
        match self.poll(job_id).await? {
            VideoPoll::Completed { download_uri } => {
                let response = self.client.get(download_uri).send().await?;
                if !response.status().is_success() {
                    return Err(ProviderError::transient(format!(
                        "video provider fetch returned {}",
                        response.status()
                    )));
                }
                let stream = response
                    .bytes_stream()
                    .map(|chunk| chunk.map_err(ProviderError::from));
                Ok(Box::pin(stream))
            }
            VideoPoll::Processing => Err(ProviderError::permanent(
                "fetch called before video job completed (InvalidState)",
            )),
            VideoPoll::Failed { error } => Err(ProviderError::permanent(format!(
                "fetch called on failed video job: {error}"
            ))),
        }
    }
}
