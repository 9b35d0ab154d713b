//! In-memory test doubles for the three provider ports. Used by the worker
//! crate's integration tests to drive specific poll-count and failure
//! scenarios without a real network call.

use crate::ProviderError;
use crate::script::ScriptPort;
use crate::video::{VideoJobId, VideoPoll, VideoPort, VideoStream};
use crate::voice::{AudioStream, VoicePort};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use serenity_core::DurationSeconds;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

pub struct FakeScriptProvider {
    script: Result<String, ProviderError>,
    calls: AtomicU64,
}

impl FakeScriptProvider {
    pub fn succeeding(script: impl Into<String>) -> Self {
        Self {
            script: Ok(script.into()),
            calls: AtomicU64::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            script: Err(error),
            calls: AtomicU64::new(0),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptPort for FakeScriptProvider {
    async fn generate(
        &self,
        _duration: DurationSeconds,
        _visual_prompt: &str,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.clone()
    }
}

pub struct FakeVoiceProvider {
    audio: Result<Vec<u8>, ProviderError>,
    calls: AtomicU64,
}

impl FakeVoiceProvider {
    pub fn succeeding(audio: Vec<u8>) -> Self {
        Self {
            audio: Ok(audio),
            calls: AtomicU64::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            audio: Err(error),
            calls: AtomicU64::new(0),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoicePort for FakeVoiceProvider {
    async fn synthesize(&self, _text: &str, _voice_id: &str) -> Result<AudioStream, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.audio {
            Ok(bytes) => {
                let chunk: Result<Bytes, ProviderError> = Ok(Bytes::from(bytes.clone()));
                Ok(Box::pin(stream::once(async { chunk })))
            }
            Err(e) => Err(e.clone()),
        }
    }
}

/// Drives a fixed sequence of poll responses: each call to `poll` advances
/// one step and sticks on the last entry once exhausted. Lets a test assert
/// exactly how many polls a worker performs before giving up or succeeding.
pub struct FakeVideoProvider {
    start_result: Result<(), ProviderError>,
    poll_sequence: Vec<VideoPoll>,
    poll_index: Mutex<usize>,
    fetch_bytes: Result<Vec<u8>, ProviderError>,
    next_job_id: AtomicU64,
}

impl FakeVideoProvider {
    pub fn new(poll_sequence: Vec<VideoPoll>, fetch_bytes: Vec<u8>) -> Self {
        Self {
            start_result: Ok(()),
            poll_sequence,
            poll_index: Mutex::new(0),
            fetch_bytes: Ok(fetch_bytes),
            next_job_id: AtomicU64::new(1),
        }
    }

    pub fn failing_start(error: ProviderError) -> Self {
        Self {
            start_result: Err(error),
            poll_sequence: Vec::new(),
            poll_index: Mutex::new(0),
            fetch_bytes: Ok(Vec::new()),
            next_job_id: AtomicU64::new(1),
        }
    }

    pub fn always_processing() -> Self {
        Self::new(vec![VideoPoll::Processing], Vec::new())
    }

    pub fn poll_count(&self) -> usize {
        // Best-effort snapshot; tests await `poll` sequentially so this
        // reflects the true call count once all futures have resolved.
        self.poll_index
            .try_lock()
            .map(|guard| *guard)
            .unwrap_or(0)
    }
}

#[async_trait]
impl VideoPort for FakeVideoProvider {
    async fn start(
        &self,
        _prompt: &str,
        _duration: DurationSeconds,
    ) -> Result<VideoJobId, ProviderError> {
        self.start_result.clone()?;
        let id = self.next_job_id.fetch_add(1, Ordering::SeqCst);
        Ok(VideoJobId(format!("fake-video-{id}")))
    }

    async fn poll(&self, _job_id: &VideoJobId) -> Result<VideoPoll, ProviderError> {
        let mut index = self.poll_index.lock().await;
        let step = (*index).min(self.poll_sequence.len().saturating_sub(1));
        let result = self
            .poll_sequence
            .get(step)
            .cloned()
            .unwrap_or(VideoPoll::Processing);
        *index += 1;
        Ok(result)
    }

    async fn fetch(&self, _job_id: &VideoJobId) -> Result<VideoStream, ProviderError> {
        match &self.fetch_bytes {
            Ok(bytes) => {
                let chunk: Result<Bytes, ProviderError> = Ok(Bytes::from(bytes.clone()));
                Ok(Box::pin(stream::once(async { chunk })))
            }
            Err(e) => Err(e.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn script_provider_counts_calls() {
        let provider = FakeScriptProvider::succeeding("breathe in, breathe out");
        let script = provider
            .generate(DurationSeconds::Sixty, "ocean")
            .await
            .expect("generate");
        assert_eq!(script, "breathe in, breathe out");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn video_provider_advances_through_sequence() {
        let provider = FakeVideoProvider::new(
            vec![
                VideoPoll::Processing,
                VideoPoll::Processing,
                VideoPoll::Completed {
                    download_uri: "https://example.test/video.mp4".to_string(),
                },
            ],
            b"fake-bytes".to_vec(),
        );
        let job_id = provider
            .start("calm ocean", DurationSeconds::Sixty)
            .await
            .expect("start");

        assert_eq!(provider.poll(&job_id).await.expect("poll 1"), VideoPoll::Processing);
        assert_eq!(provider.poll(&job_id).await.expect("poll 2"), VideoPoll::Processing);
        assert_eq!(
            provider.poll(&job_id).await.expect("poll 3"),
            VideoPoll::Completed {
                download_uri: "https://example.test/video.mp4".to_string(),
            }
        );
    }
}
