use crate::WorkerError;
use futures::StreamExt;
use serenity_compose::ByteStream as ComposeStream;
use serenity_compose::CompositionInput;
use serenity_compose::MediaComposer;
use serenity_core::GenerationStatus;
use serenity_core::RequestId;
use serenity_providers::DEFAULT_VOICE_ID;
use serenity_providers::ProviderError;
use serenity_providers::ScriptPort;
use serenity_providers::VideoJobId;
use serenity_providers::VideoPoll;
use serenity_providers::VideoPort;
use serenity_providers::VoicePort;
use serenity_storage::ByteStream as StorageStream;
use serenity_storage::ObjectStore;
use serenity_storage::keys;
use serenity_store::NewVideo;
use serenity_store::RequestStore;
use std::sync::Arc;
use std::time::Duration;

/// Interval between Veo poll attempts (spec §4.6 step 4b).
pub const VEO_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Poll cap; `VEO_POLL_INTERVAL * VEO_MAX_POLLS` = 8 minutes (spec §4.6 step 4c).
pub const VEO_MAX_POLLS: u32 = 48;

pub struct PipelineWorker {
    pub(crate) store: RequestStore,
    pub(crate) script: Arc<dyn ScriptPort>,
    pub(crate) voice: Arc<dyn VoicePort>,
    pub(crate) video: Arc<dyn VideoPort>,
    pub(crate) object_store: Arc<dyn ObjectStore>,
    pub(crate) composer: Arc<dyn MediaComposer>,
    pub(crate) veo_poll_interval: Duration,
    pub(crate) veo_max_polls: u32,
}

impl PipelineWorker {
    pub fn new(
        store: RequestStore,
        script: Arc<dyn ScriptPort>,
        voice: Arc<dyn VoicePort>,
        video: Arc<dyn VideoPort>,
        object_store: Arc<dyn ObjectStore>,
        composer: Arc<dyn MediaComposer>,
    ) -> Self {
        Self {
            store,
            script,
            voice,
            video,
            object_store,
            composer,
            veo_poll_interval: VEO_POLL_INTERVAL,
            veo_max_polls: VEO_MAX_POLLS,
        }
    }

    /// Overrides the poll cadence used while waiting on video generation.
    /// Production callers keep the defaults; tests use this to exercise the
    /// timeout path without a real 8-minute wait.
    pub fn with_poll_settings(mut self, interval: Duration, max_polls: u32) -> Self {
        self.veo_poll_interval = interval;
        self.veo_max_polls = max_polls;
        self
    }

    /// One attempt at driving `request_id` through the five stages (spec
    /// §4.6 algorithm). Returns `Ok(())` once the request reaches
    /// `completed`. Any `Err` propagates to the queue's retry policy; the
    /// caller (the runner) is responsible for deciding whether to mark the
    /// request `failed` once attempts are exhausted.
    pub async fn run_once(&self, request_id: RequestId) -> Result<(), WorkerError> {
        let mut request = self
            .store
            .get(request_id)
            .await?
            .ok_or(WorkerError::NotFound)?;

        if request.status.is_terminal() {
            // Retried message after a prior attempt already finished the
            // job (spec §4.6 "idempotency across retries").
            return Ok(());
        }

        // Stage 2: script.
        self.store
            .update_progress(request_id, GenerationStatus::GeneratingScript, 5)
            .await?;
        let needs_generation = !request.script_type.requires_script_content()
            && request
                .script_content
                .as_deref()
                .map(str::is_empty)
                .unwrap_or(true);
        if needs_generation {
            let script = self
                .script
                .generate(request.duration_seconds, &request.visual_prompt)
                .await?;
            self.store.set_script_content(request_id, &script).await?;
            request.script_content = Some(script);
        }
        self.store
            .update_progress(request_id, GenerationStatus::GeneratingScript, 15)
            .await?;
        let script = request.script_content.clone().unwrap_or_default();

        // Stage 3: voice.
        self.store
            .update_progress(request_id, GenerationStatus::GeneratingVoice, 20)
            .await?;
        let audio = self.voice.synthesize(&script, DEFAULT_VOICE_ID).await?;
        self.object_store
            .put_stream(
                &keys::voiceover(&request_id.to_string()),
                "audio/mpeg",
                adapt_provider_stream_to_storage(audio),
            )
            .await?;
        self.store
            .update_progress(request_id, GenerationStatus::GeneratingVoice, 35)
            .await?;

        // Stage 4: video.
        self.store
            .update_progress(request_id, GenerationStatus::GeneratingVideo, 40)
            .await?;
        let job_id = self
            .video
            .start(&request.visual_prompt, request.duration_seconds)
            .await?;

        let mut polls = 0u32;
        loop {
            match self.video.poll(&job_id).await? {
                VideoPoll::Completed { .. } => break,
                VideoPoll::Failed { error } => {
                    return Err(WorkerError::Provider(ProviderError::permanent(error)));
                }
                VideoPoll::Processing => {
                    polls += 1;
                    if polls >= VEO_MAX_POLLS {
                        return Err(WorkerError::Timeout(
                            "Veo generation timed out after 8 minutes".to_string(),
                        ));
                    }
                    let progress = 40 + ((polls * 35 + VEO_MAX_POLLS / 2) / VEO_MAX_POLLS).min(35);
                    self.store
                        .update_progress(
                            request_id,
                            GenerationStatus::GeneratingVideo,
                            progress as u8,
                        )
                        .await?;
                    tokio::time::sleep(VEO_POLL_INTERVAL).await;
                }
            }
        }

        // Stage 5: compose.
        let scratch = self.composer.begin_scratch().await?;
        let compose_result = self.compose_and_publish(&request, &job_id, &scratch).await;
        // Always clean up the scratch directory, success or failure (§4.6 step 6).
        if let Err(cleanup_err) = scratch.cleanup().await {
            tracing::warn!(
                %request_id,
                error = %cleanup_err,
                "failed to clean up composer scratch directory"
            );
        }
        compose_result
    }

    async fn compose_and_publish(
        &self,
        request: &serenity_core::GenerationRequest,
        job_id: &VideoJobId,
        scratch: &serenity_compose::ScratchDir,
    ) -> Result<(), WorkerError> {
        let request_id = request.id;

        let ambient_stream = match request.ambient_sound_id {
            Some(id) => Some(
                self.object_store
                    .get_stream(&keys::ambient_track(&id))
                    .await?,
            ),
            None => None,
        };
        let music_stream = match request.music_track_id {
            Some(id) => Some(
                self.object_store
                    .get_stream(&keys::music_track(&id))
                    .await?,
            ),
            None => None,
        };

        let video_stream = self.video.fetch(job_id).await?;
        let voiceover_stream = self
            .object_store
            .get_stream(&keys::voiceover(&request_id.to_string()))
            .await?;

        let composition = self
            .composer
            .compose(
                scratch,
                CompositionInput {
                    video_stream: adapt_provider_stream_to_compose(video_stream),
                    voiceover_stream: adapt_storage_stream_to_compose(voiceover_stream),
                    ambient_stream: ambient_stream.map(adapt_storage_stream_to_compose),
                    music_stream: music_stream.map(adapt_storage_stream_to_compose),
                    requested_duration_seconds: request.duration_seconds.as_u32(),
                },
            )
            .await?;
        self.store
            .update_progress(request_id, GenerationStatus::Compositing, 95)
            .await?;

        let final_video_stream = file_to_stream(&composition.video_path).await?;
        let thumbnail_stream = file_to_stream(&composition.thumbnail_path).await?;

        // Spec §4.6 step 5d: uploads may proceed in parallel.
        let final_key = keys::final_video(&request_id.to_string());
        let thumbnail_key = keys::thumbnail(&request_id.to_string());
        let (final_result, thumbnail_result) = tokio::join!(
            self.object_store
                .put_stream(&final_key, "video/mp4", final_video_stream),
            self.object_store
                .put_stream(&thumbnail_key, "image/jpeg", thumbnail_stream),
        );
        final_result?;
        thumbnail_result?;

        self.store
            .complete_with_video(
                request_id,
                NewVideo {
                    user_id: request.user_id,
                    title: serenity_core::title_from_prompt(&request.visual_prompt),
                    storage_key: final_key,
                    thumbnail_key,
                    duration_seconds: composition.duration_seconds,
                    visual_prompt: request.visual_prompt.clone(),
                },
            )
            .await?;

        Ok(())
    }
}

/// Streams a scratch file straight to the object store without
/// materializing it in memory (§9 "Streaming IO"): the worker never loads a
/// whole artifact into a buffer.
async fn file_to_stream(path: &std::path::Path) -> Result<StorageStream, WorkerError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| serenity_compose::ComposeError::Io(e.to_string()))?;
    Ok(Box::pin(
        tokio_util::io::ReaderStream::new(file)
            .map(|chunk| chunk.map_err(|e| serenity_storage::StorageError::Transport(e.to_string()))),
    ))
}

fn adapt_provider_stream_to_storage(stream: serenity_providers::AudioStream) -> StorageStream {
    Box::pin(stream.map(|chunk| {
        chunk.map_err(|e| serenity_storage::StorageError::Transport(e.to_string()))
    }))
}

fn adapt_provider_stream_to_compose(stream: serenity_providers::VideoStream) -> ComposeStream {
    Box::pin(stream.map(|chunk| {
        chunk.map_err(|e| serenity_compose::ComposeError::UpstreamStream(e.to_string()))
    }))
}

fn adapt_storage_stream_to_compose(stream: StorageStream) -> ComposeStream {
    Box::pin(stream.map(|chunk| {
        chunk.map_err(|e| serenity_compose::ComposeError::UpstreamStream(e.to_string()))
    }))
}
