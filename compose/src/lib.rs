//! Media Composer collaborator (spec §4.6 step 5, §6 "Media Composer
//! interface"). Mixes a voiceover track over an optional ambient bed and
//! music track, muxes the result against the generated video, and extracts a
//! thumbnail frame — all via a shelled-out `ffmpeg` process, the same way the
//! rest of this workspace shells out to external tools rather than
//! reimplementing codecs.
//!
//! The scratch directory is created up front and must be cleaned up by the
//! caller once it is done with the composition, success or failure, per
//! spec §4.6 step 6.

mod fake;
mod ffmpeg;

pub use fake::FakeComposer;
pub use ffmpeg::FfmpegComposer;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::path::{Path, PathBuf};

pub type ByteStream = BoxStream<'static, Result<Bytes, ComposeError>>;

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("failed to prepare scratch directory: {0}")]
    Scratch(String),
    #[error("failed to write input stream to disk: {0}")]
    Io(String),
    #[error("ffmpeg exited with a failure: {0}")]
    Transcode(String),
    #[error("upstream stream failed before composition: {0}")]
    UpstreamStream(String),
}

/// Audio mix gains per spec §6: voiceover is the primary signal, ambient and
/// music sit underneath it.
pub const VOICEOVER_GAIN: f32 = 1.0;
pub const AMBIENT_GAIN: f32 = 0.3;
pub const MUSIC_GAIN: f32 = 0.2;

/// A scratch working directory for one composition attempt. Call
/// [`ScratchDir::cleanup`] when done, regardless of whether composition
/// succeeded. `Drop` best-effort-removes the directory as a backstop if
/// `cleanup` was never called.
pub struct ScratchDir {
    dir: Option<tempfile::TempDir>,
}

impl ScratchDir {
    fn new(dir: tempfile::TempDir) -> Self {
        Self { dir: Some(dir) }
    }

    pub fn path(&self) -> &Path {
        self.dir
            .as_ref()
            .map(tempfile::TempDir::path)
            .unwrap_or_else(|| Path::new("."))
    }

    pub async fn cleanup(mut self) -> Result<(), ComposeError> {
        if let Some(dir) = self.dir.take() {
            let path = dir.into_path();
            tokio::fs::remove_dir_all(&path)
                .await
                .map_err(|e| ComposeError::Io(format!("cleanup {}: {e}", path.display())))?;
        }
        Ok(())
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let _ = std::fs::remove_dir_all(dir.path());
        }
    }
}

pub struct CompositionInput {
    pub video_stream: ByteStream,
    pub voiceover_stream: ByteStream,
    pub ambient_stream: Option<ByteStream>,
    pub music_stream: Option<ByteStream>,
    /// The request's requested duration; the produced video is trimmed to
    /// this length rather than measured after the fact.
    pub requested_duration_seconds: u32,
}

pub struct Composition {
    pub video_path: PathBuf,
    pub thumbnail_path: PathBuf,
    pub duration_seconds: u32,
}

#[async_trait]
pub trait MediaComposer: Send + Sync {
    async fn begin_scratch(&self) -> Result<ScratchDir, ComposeError>;

    async fn compose(
        &self,
        scratch: &ScratchDir,
        input: CompositionInput,
    ) -> Result<Composition, ComposeError>;
}
