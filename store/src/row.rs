use chrono::DateTime;
use chrono::Utc;
use serenity_core::DurationSeconds;
use serenity_core::GenerationRequest;
use serenity_core::Video;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct GenerationRequestRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub visual_prompt: String,
    pub script_type: String,
    pub script_content: Option<String>,
    pub duration_seconds: i32,
    pub ambient_sound_id: Option<Uuid>,
    pub music_track_id: Option<Uuid>,
    pub visibility: String,
    pub credits_charged: i64,
    pub status: String,
    pub progress: i16,
    pub video_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationRequestRow {
    pub(crate) fn into_domain(self) -> Result<GenerationRequest, String> {
        let duration_seconds = DurationSeconds::try_from(
            u32::try_from(self.duration_seconds)
                .map_err(|_| "negative duration_seconds".to_string())?,
        )?;
        Ok(GenerationRequest {
            id: self.id.into(),
            user_id: self.user_id.into(),
            visual_prompt: self.visual_prompt,
            script_type: self.script_type.parse()?,
            script_content: self.script_content,
            duration_seconds,
            ambient_sound_id: self.ambient_sound_id,
            music_track_id: self.music_track_id,
            visibility: self.visibility.parse()?,
            credits_charged: u32::try_from(self.credits_charged)
                .map_err(|_| "negative credits_charged".to_string())?,
            status: self.status.parse()?,
            progress: u8::try_from(self.progress).map_err(|_| "invalid progress".to_string())?,
            video_id: self.video_id.map(Into::into),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct VideoRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub storage_key: String,
    pub thumbnail_key: String,
    pub duration_seconds: i32,
    pub visibility: String,
    pub moderation_status: String,
    pub visual_prompt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRow {
    pub(crate) fn into_domain(self) -> Result<Video, String> {
        Ok(Video {
            id: self.id.into(),
            user_id: self.user_id.into(),
            title: self.title,
            storage_key: self.storage_key,
            thumbnail_key: self.thumbnail_key,
            duration_seconds: u32::try_from(self.duration_seconds)
                .map_err(|_| "negative duration_seconds".to_string())?,
            visibility: self.visibility.parse()?,
            moderation_status: self.moderation_status.parse()?,
            visual_prompt: self.visual_prompt,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
