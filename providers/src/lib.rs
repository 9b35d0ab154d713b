//! Provider Ports (spec §4.5, component C5): three narrow interfaces, each
//! implemented by an adapter over a real external AI API and a fake used in
//! worker tests. Every adapter applies a per-call timeout (generate/fetch
//! >= 60s, poll >= 30s) at the `reqwest::Client` level.

mod error;
mod fakes;
mod script;
mod video;
mod voice;

pub use error::ProviderError;
pub use fakes::FakeScriptProvider;
pub use fakes::FakeVideoProvider;
pub use fakes::FakeVoiceProvider;
pub use script::HttpScriptProvider;
pub use script::ScriptPort;
pub use video::HttpVideoProvider;
pub use video::VideoJobId;
pub use video::VideoPoll;
pub use video::VideoPort;
pub use video::VideoStream;
pub use voice::AudioStream;
pub use voice::DEFAULT_VOICE_ID;
pub use voice::HttpVoiceProvider;
pub use voice::VoicePort;

use std::time::Duration;

pub const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);
pub const POLL_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::permanent(format!("failed to build http client: {e}")))
}
