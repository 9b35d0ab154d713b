//! Request Store (spec §4.2, component C2).
//!
//! Writes are always guarded by `id` equality (workers) or
//! `id = ? AND user_id = ?` (owner-scoped reads), matching spec §4.2's
//! rule that no query lets one user observe another user's request.

mod model;
mod row;

pub use model::Page;

use chrono::DateTime;
use chrono::Utc;
use row::GenerationRequestRow;
use row::VideoRow;
use serenity_core::GenerationRequest;
use serenity_core::GenerationStatus;
use serenity_core::NewGenerationRequest;
use serenity_core::RequestId;
use serenity_core::UserId;
use serenity_core::Video;
use serenity_core::VideoId;
use sqlx::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("generation request {0} not found")]
    NotFound(RequestId),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

#[derive(Clone)]
pub struct RequestStore {
    pool: PgPool,
}

impl RequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewGenerationRequest) -> Result<GenerationRequest, StoreError> {
        let mut tx = self.pool.begin().await?;
        let request = self.create_in_tx(&mut tx, new).await?;
        tx.commit().await?;
        Ok(request)
    }

    /// Same insert as [`RequestStore::create`], but runs inside a
    /// transaction the caller owns — used by the submission path so the
    /// ledger reserve and the request insert commit or roll back together
    /// (spec §4.4 step 3).
    pub async fn create_in_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        new: NewGenerationRequest,
    ) -> Result<GenerationRequest, StoreError> {
        let id = RequestId::new();
        let row = sqlx::query_as::<_, GenerationRequestRow>(
            r#"
INSERT INTO generation_requests (
    id, user_id, visual_prompt, script_type, script_content, duration_seconds,
    ambient_sound_id, music_track_id, visibility, credits_charged, status, progress
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', 0)
RETURNING *
            "#,
        )
        .bind(id.0)
        .bind(new.user_id.0)
        .bind(&new.visual_prompt)
        .bind(new.script_type.as_str())
        .bind(&new.script_content)
        .bind(new.duration_seconds.as_u32() as i32)
        .bind(new.ambient_sound_id)
        .bind(new.music_track_id)
        .bind(new.visibility.as_str())
        .bind(i64::from(new.credits_charged))
        .fetch_one(&mut **tx)
        .await?;
        row.into_domain().map_err(StoreError::CorruptRow)
    }

    pub async fn get(&self, id: RequestId) -> Result<Option<GenerationRequest>, StoreError> {
        let row = sqlx::query_as::<_, GenerationRequestRow>(
            "SELECT * FROM generation_requests WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.into_domain().map_err(StoreError::CorruptRow))
            .transpose()
    }

    /// Owner-scoped fetch used by the progress endpoint (§4.7): returns
    /// `None` both when the id doesn't exist and when it belongs to another
    /// user, so callers can't distinguish the two (P4).
    pub async fn get_owned(
        &self,
        id: RequestId,
        user_id: UserId,
    ) -> Result<Option<GenerationRequest>, StoreError> {
        let row = sqlx::query_as::<_, GenerationRequestRow>(
            "SELECT * FROM generation_requests WHERE id = $1 AND user_id = $2",
        )
        .bind(id.0)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.into_domain().map_err(StoreError::CorruptRow))
            .transpose()
    }

    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: u32,
        limit: u32,
    ) -> Result<Page<GenerationRequest>, StoreError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 50);
        let offset = i64::from((page - 1) * limit);

        let rows = sqlx::query_as::<_, GenerationRequestRow>(
            r#"
SELECT * FROM generation_requests
WHERE user_id = $1
ORDER BY created_at DESC
LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id.0)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM generation_requests WHERE user_id = $1",
        )
        .bind(user_id.0)
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|r| r.into_domain().map_err(StoreError::CorruptRow))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            page,
            limit,
            total: total.max(0) as u64,
        })
    }

    /// Sets `script_content` without touching status/progress. Used by the
    /// worker's script stage when `scriptType = ai_generated`.
    pub async fn set_script_content(
        &self,
        id: RequestId,
        script_content: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE generation_requests SET script_content = $1, updated_at = now() WHERE id = $2",
        )
        .bind(script_content)
        .bind(id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Advances `status`/`progress` together. G2 (progress monotonicity) is
    /// enforced here, not trusted to the caller: a write that would lower
    /// progress is rejected at the SQL layer.
    pub async fn update_progress(
        &self,
        id: RequestId,
        status: GenerationStatus,
        progress: u8,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
UPDATE generation_requests
SET status = $1, progress = $2, updated_at = now()
WHERE id = $3 AND progress <= $2
            "#,
        )
        .bind(status.as_str())
        .bind(i16::from(progress))
        .bind(id.0)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            tracing::warn!(request_id = %id, progress, "progress update skipped: would regress");
        }
        Ok(())
    }

    /// Terminal success: inserts the [`Video`] row and links it from the
    /// request in one transaction (G3: `completed ⇒ video_id set`).
    pub async fn complete_with_video(
        &self,
        id: RequestId,
        video: NewVideo,
    ) -> Result<Video, StoreError> {
        let mut tx = self.pool.begin().await?;
        let video_id = VideoId::new();

        // Visibility always starts `pending_review` regardless of the
        // request's public/private choice; only moderation can change it
        // (spec §3 Invariant V1).
        let video_row = sqlx::query_as::<_, VideoRow>(
            r#"
INSERT INTO videos (
    id, user_id, title, storage_key, thumbnail_key, duration_seconds,
    visibility, moderation_status, visual_prompt
) VALUES ($1, $2, $3, $4, $5, $6, 'pending_review', 'pending', $7)
RETURNING *
            "#,
        )
        .bind(video_id.0)
        .bind(video.user_id.0)
        .bind(&video.title)
        .bind(&video.storage_key)
        .bind(&video.thumbnail_key)
        .bind(video.duration_seconds as i32)
        .bind(&video.visual_prompt)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
UPDATE generation_requests
SET status = 'completed', progress = 100, video_id = $1, updated_at = now()
WHERE id = $2
            "#,
        )
        .bind(video_id.0)
        .bind(id.0)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        video_row.into_domain().map_err(StoreError::CorruptRow)
    }

    /// Terminal failure: §7 says only the queue's "attempts exhausted" hook
    /// may call this. Progress is left untouched (frozen, per §4.6).
    pub async fn mark_failed(&self, id: RequestId) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE generation_requests SET status = 'failed', updated_at = now() WHERE id = $1",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Requests stuck in `pending` longer than `older_than` — candidates for
    /// the sweeper to re-enqueue (§4.4 Ordering guarantee S1).
    pub async fn find_stale_pending(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<RequestId>, StoreError> {
        let ids: Vec<uuid::Uuid> = sqlx::query_scalar(
            "SELECT id FROM generation_requests WHERE status = 'pending' AND updated_at < $1",
        )
        .bind(older_than)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(RequestId::from).collect())
    }
}

/// Parameters for [`RequestStore::complete_with_video`]. No `visibility`
/// field: the store always inserts `pending_review` (spec §3 Invariant V1).
pub struct NewVideo {
    pub user_id: UserId,
    pub title: String,
    pub storage_key: String,
    pub thumbnail_key: String,
    pub duration_seconds: u32,
    pub visual_prompt: String,
}
