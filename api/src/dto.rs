use chrono::DateTime;
use chrono::Utc;
use serenity_core::DurationSeconds;
use serenity_core::GenerationRequest;
use serenity_core::GenerationStatus;
use serenity_core::RequestId;
use serenity_core::ScriptType;
use serenity_core::VideoId;
use serenity_core::Visibility;
use serenity_store::Page;
use serenity_submission::SubmissionRequest;

/// Wire shape of `POST /api/generations` (spec §6 schema).
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitGenerationBody {
    pub visual_prompt: String,
    pub script_type: ScriptType,
    pub script_content: Option<String>,
    pub duration_seconds: DurationSeconds,
    pub ambient_sound_id: Option<uuid::Uuid>,
    pub music_track_id: Option<uuid::Uuid>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl SubmitGenerationBody {
    pub fn into_submission_request(
        self,
        user_id: serenity_core::UserId,
    ) -> SubmissionRequest {
        SubmissionRequest {
            user_id,
            visual_prompt: self.visual_prompt,
            script_type: self.script_type,
            script_content: self.script_content,
            duration_seconds: self.duration_seconds,
            ambient_sound_id: self.ambient_sound_id,
            music_track_id: self.music_track_id,
            visibility: self.visibility,
        }
    }
}

/// Wire shape of a [`GenerationRequest`] (camelCase, per spec §6).
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub id: RequestId,
    pub visual_prompt: String,
    pub script_type: ScriptType,
    pub duration_seconds: DurationSeconds,
    pub visibility: Visibility,
    pub credits_charged: u32,
    pub status: GenerationStatus,
    pub progress: u8,
    pub video_id: Option<VideoId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GenerationRequest> for GenerationResponse {
    fn from(request: GenerationRequest) -> Self {
        Self {
            id: request.id,
            visual_prompt: request.visual_prompt,
            script_type: request.script_type,
            duration_seconds: request.duration_seconds,
            visibility: request.visibility,
            credits_charged: request.credits_charged,
            status: request.status,
            progress: request.progress,
            video_id: request.video_id,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

/// Query params for `GET /api/generations` (spec §6: `page>=1`, `1<=limit<=50`).
#[derive(Debug, serde::Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub items: Vec<GenerationResponse>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl From<Page<GenerationRequest>> for PageResponse {
    fn from(page: Page<GenerationRequest>) -> Self {
        Self {
            items: page.items.into_iter().map(GenerationResponse::from).collect(),
            page: page.page,
            limit: page.limit,
            total: page.total,
        }
    }
}

/// Wire shape of `GET /api/generations/:id/progress` (spec §4.7).
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub id: RequestId,
    pub status: GenerationStatus,
    pub progress: u8,
    pub video_id: Option<VideoId>,
}

impl From<GenerationRequest> for ProgressResponse {
    fn from(request: GenerationRequest) -> Self {
        Self {
            id: request.id,
            status: request.status,
            progress: request.progress,
            video_id: request.video_id,
        }
    }
}
