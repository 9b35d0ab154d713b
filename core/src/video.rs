use crate::ModerationStatus;
use crate::UserId;
use crate::VideoId;
use crate::VideoVisibility;
use chrono::DateTime;
use chrono::Utc;

/// Created only at the tail of a successful pipeline (spec §3, Invariant V1).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub user_id: UserId,
    pub title: String,
    pub storage_key: String,
    pub thumbnail_key: String,
    pub duration_seconds: u32,
    pub visibility: VideoVisibility,
    pub moderation_status: ModerationStatus,
    pub visual_prompt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Longest prefix of a visual prompt usable as a video title (§4.6 step 5e).
pub fn title_from_prompt(visual_prompt: &str) -> String {
    visual_prompt.chars().take(200).collect()
}
