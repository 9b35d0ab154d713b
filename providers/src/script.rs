use crate::ProviderError;
use crate::http_client;
use async_trait::async_trait;
use serenity_core::DurationSeconds;

/// Target words-per-minute a generated script should land near (spec §4.5:
/// "length proportional to duration, ≈130 wpm").
pub const TARGET_WORDS_PER_MINUTE: u32 = 130;

#[async_trait]
pub trait ScriptPort: Send + Sync {
    /// `visual_prompt` doubles as the thematic hint, per §4.6 step 2.
    async fn generate(
        &self,
        duration: DurationSeconds,
        visual_prompt: &str,
    ) -> Result<String, ProviderError>;
}

#[derive(serde::Serialize)]
struct GenerateRequest<'a> {
    meditation_type: &'a str,
    duration_seconds: u32,
    target_words: u32,
    theme: &'a str,
}

#[derive(serde::Deserialize)]
struct GenerateResponse {
    script: String,
}

pub struct HttpScriptProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpScriptProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(crate::GENERATE_TIMEOUT)?,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl ScriptPort for HttpScriptProvider {
    async fn generate(
        &self,
        duration: DurationSeconds,
        visual_prompt: &str,
    ) -> Result<String, ProviderError> {
        let target_words = (duration.as_u32() * TARGET_WORDS_PER_MINUTE) / 60;
        let response = self
            .client
            .post(format!("{}/v1/scripts", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&GenerateRequest {
                meditation_type: "guided_meditation",
                duration_seconds: duration.as_u32(),
                target_words,
                theme: visual_prompt,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.script)
    }
}

fn classify_status(status: reqwest::StatusCode, body: String) -> ProviderError {
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        ProviderError::transient(format!("script provider returned {status}: {body}"))
    } else {
        ProviderError::permanent(format!("script provider returned {status}: {body}"))
    }
}
