use crate::DurationSeconds;
use crate::GenerationStatus;
use crate::RequestId;
use crate::ScriptType;
use crate::UserId;
use crate::VideoId;
use crate::Visibility;
use chrono::DateTime;
use chrono::Utc;

/// A user-submitted intent to produce one video (spec §3).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GenerationRequest {
    pub id: RequestId,
    pub user_id: UserId,
    pub visual_prompt: String,
    pub script_type: ScriptType,
    pub script_content: Option<String>,
    pub duration_seconds: DurationSeconds,
    pub ambient_sound_id: Option<uuid::Uuid>,
    pub music_track_id: Option<uuid::Uuid>,
    pub visibility: Visibility,
    pub credits_charged: u32,
    pub status: GenerationStatus,
    pub progress: u8,
    pub video_id: Option<VideoId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationRequest {
    /// True once `progress` has reached 100 and status is terminal-success.
    pub fn is_complete(&self) -> bool {
        self.status == GenerationStatus::Completed && self.progress == 100
    }
}

/// Parameters accepted by the Request Store's create operation. Separate
/// from [`GenerationRequest`] because `id`/`status`/`progress`/timestamps
/// are assigned by the store, not the caller.
#[derive(Debug, Clone)]
pub struct NewGenerationRequest {
    pub user_id: UserId,
    pub visual_prompt: String,
    pub script_type: ScriptType,
    pub script_content: Option<String>,
    pub duration_seconds: DurationSeconds,
    pub ambient_sound_id: Option<uuid::Uuid>,
    pub music_track_id: Option<uuid::Uuid>,
    pub visibility: Visibility,
    pub credits_charged: u32,
}
