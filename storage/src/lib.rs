//! Object storage port (external collaborator per spec §1, layout in §6).
//!
//! The worker never loads a whole artifact into memory: every put/get is a
//! byte stream (§9 "Streaming IO"). [`S3Store`] is the production adapter;
//! [`FakeStore`] buffers in memory for tests where a real bucket isn't
//! available.

mod fake;
mod s3;

pub use fake::FakeStore;
pub use s3::S3Store;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

pub type ByteStream = BoxStream<'static, Result<Bytes, StorageError>>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_stream(
        &self,
        key: &str,
        content_type: &str,
        body: ByteStream,
    ) -> Result<(), StorageError>;

    async fn get_stream(&self, key: &str) -> Result<ByteStream, StorageError>;
}

/// Object keys as laid out in spec §6.
pub mod keys {
    pub fn voiceover(request_id: &str) -> String {
        format!("generations/{request_id}/voiceover.mp3")
    }

    pub fn final_video(request_id: &str) -> String {
        format!("videos/{request_id}/final.mp4")
    }

    pub fn thumbnail(request_id: &str) -> String {
        format!("videos/{request_id}/thumbnail.jpg")
    }

    /// Ambient sound and music tracks live in a shared catalog bucket
    /// prefix, keyed by the catalog ids carried on the request
    /// (`ambientSoundId`/`musicTrackId`, spec §3). The catalog itself is an
    /// out-of-scope external collaborator; this crate only needs to know
    /// where its assets land in object storage.
    pub fn ambient_track(ambient_sound_id: &uuid::Uuid) -> String {
        format!("catalog/ambient/{ambient_sound_id}.mp3")
    }

    pub fn music_track(music_track_id: &uuid::Uuid) -> String {
        format!("catalog/music/{music_track_id}.mp3")
    }
}
