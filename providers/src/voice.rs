use crate::ProviderError;
use crate::http_client;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;

pub type AudioStream = BoxStream<'static, Result<Bytes, ProviderError>>;

pub const DEFAULT_VOICE_ID: &str = "calm-narrator-en";

#[async_trait]
pub trait VoicePort: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioStream, ProviderError>;
}

#[derive(serde::Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    format: &'a str,
}

pub struct HttpVoiceProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpVoiceProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(crate::GENERATE_TIMEOUT)?,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl VoicePort for HttpVoiceProvider {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioStream, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SynthesizeRequest {
                text,
                voice_id,
                format: "mp3",
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_server_error() {
                ProviderError::transient(format!("voice provider returned {status}: {body}"))
            } else {
                ProviderError::permanent(format!("voice provider returned {status}: {body}"))
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ProviderError::from));
        Ok(Box::pin(stream))
    }
}
