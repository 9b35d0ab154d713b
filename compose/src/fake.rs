use crate::ByteStream;
use crate::Composition;
use crate::CompositionInput;
use crate::ComposeError;
use crate::MediaComposer;
use crate::ScratchDir;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

/// In-memory [`MediaComposer`] double for worker tests: drains the input
/// streams (to catch upstream stream errors the same way the real composer
/// would) and writes tiny placeholder files instead of shelling out to
/// `ffmpeg`.
#[derive(Default)]
pub struct FakeComposer {
    compose_calls: AtomicUsize,
}

impl FakeComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compose_calls(&self) -> usize {
        self.compose_calls.load(Ordering::SeqCst)
    }

    async fn drain(stream: ByteStream) -> Result<(), ComposeError> {
        let mut stream = stream;
        while let Some(chunk) = stream.next().await {
            chunk?;
        }
        Ok(())
    }
}

#[async_trait]
impl MediaComposer for FakeComposer {
    async fn begin_scratch(&self) -> Result<ScratchDir, ComposeError> {
        let dir = tempfile::tempdir()
            .map_err(|e| ComposeError::Scratch(format!("failed to create scratch dir: {e}")))?;
        Ok(ScratchDir::new(dir))
    }

    async fn compose(
        &self,
        scratch: &ScratchDir,
        input: CompositionInput,
    ) -> Result<Composition, ComposeError> {
        self.compose_calls.fetch_add(1, Ordering::SeqCst);
        Self::drain(input.video_stream).await?;
        Self::drain(input.voiceover_stream).await?;
        if let Some(stream) = input.ambient_stream {
            Self::drain(stream).await?;
        }
        if let Some(stream) = input.music_stream {
            Self::drain(stream).await?;
        }

        let video_path = scratch.path().join("final.mp4");
        let thumbnail_path = scratch.path().join("thumbnail.jpg");
        tokio::fs::write(&video_path, b"fake-video")
            .await
            .map_err(|e| ComposeError::Io(e.to_string()))?;
        tokio::fs::write(&thumbnail_path, b"fake-thumbnail")
            .await
            .map_err(|e| ComposeError::Io(e.to_string()))?;

        Ok(Composition {
            video_path,
            thumbnail_path,
            duration_seconds: input.requested_duration_seconds,
        })
    }
}
