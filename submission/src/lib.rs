//! Submission Service (spec §4.4, component C4): validate, price, reserve
//! credits, persist the request, and enqueue the job, in that order, with
//! the reserve and the persist committing atomically together.

mod validate;

pub use validate::SubmissionRequest;

use serenity_core::FieldErrors;
use serenity_core::GenerationRequest;
use serenity_core::NewGenerationRequest;
use serenity_core::RequestId;
use serenity_core::price_for;
use serenity_ledger::Ledger;
use serenity_ledger::LedgerError;
use serenity_queue::JobQueue;
use serenity_store::RequestStore;
use serenity_store::StoreError;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("insufficient credits: {required} required")]
    InsufficientCredits { required: u32 },
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for SubmissionError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

pub struct SubmissionService {
    pool: PgPool,
    ledger: Ledger,
    store: RequestStore,
    queue: Arc<dyn JobQueue>,
}

impl SubmissionService {
    pub fn new(pool: PgPool, ledger: Ledger, store: RequestStore, queue: Arc<dyn JobQueue>) -> Self {
        Self {
            pool,
            ledger,
            store,
            queue,
        }
    }

    /// Spec §4.4 algorithm, steps 1-5.
    pub async fn submit(
        &self,
        request: SubmissionRequest,
    ) -> Result<GenerationRequest, SubmissionError> {
        request.validate().map_err(SubmissionError::Validation)?;

        let credits_needed = price_for(request.duration_seconds, request.visibility);

        let created = self.reserve_and_persist(&request, credits_needed).await?;

        if let Err(err) = self.queue.enqueue(created.id).await {
            tracing::error!(
                request_id = %created.id,
                error = %err,
                "enqueue failed after commit; marking request failed (credits remain spent)"
            );
            if let Err(mark_err) = self.store.mark_failed(created.id).await {
                tracing::error!(
                    request_id = %created.id,
                    error = %mark_err,
                    "failed to mark request failed after enqueue failure"
                );
            }
            return Err(SubmissionError::Internal(format!(
                "failed to enqueue request {}: {err}",
                created.id
            )));
        }

        Ok(created)
    }

    async fn reserve_and_persist(
        &self,
        request: &SubmissionRequest,
        credits_needed: u32,
    ) -> Result<GenerationRequest, SubmissionError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SubmissionError::Internal(e.to_string()))?;

        let reserve_result = self
            .ledger
            .reserve_in_tx(
                &mut tx,
                request.user_id,
                credits_needed,
                "meditation video generation",
            )
            .await;

        match reserve_result {
            Ok(_balance) => {}
            Err(LedgerError::InsufficientCredits { required }) => {
                return Err(SubmissionError::InsufficientCredits { required });
            }
            Err(other) => return Err(SubmissionError::Internal(other.to_string())),
        }

        let new_request = NewGenerationRequest {
            user_id: request.user_id,
            visual_prompt: request.visual_prompt.clone(),
            script_type: request.script_type,
            script_content: request.script_content.clone(),
            duration_seconds: request.duration_seconds,
            ambient_sound_id: request.ambient_sound_id,
            music_track_id: request.music_track_id,
            visibility: request.visibility,
            credits_charged: credits_needed,
        };

        let created = self.store.create_in_tx(&mut tx, new_request).await?;

        tx.commit()
            .await
            .map_err(|e| SubmissionError::Internal(e.to_string()))?;

        Ok(created)
    }
}

/// Background sweeper (spec §4.4 Ordering guarantee S1, implemented per
/// SPEC_FULL §B): re-enqueues requests stuck in `pending` past `grace`, in
/// case the post-commit enqueue in [`SubmissionService::submit`] was lost.
pub struct Sweeper {
    store: RequestStore,
    queue: Arc<dyn JobQueue>,
    grace: chrono::Duration,
}

impl Sweeper {
    pub fn new(store: RequestStore, queue: Arc<dyn JobQueue>, grace: chrono::Duration) -> Self {
        Self {
            store,
            queue,
            grace,
        }
    }

    /// Runs one sweep, returning the number of requests re-enqueued.
    pub async fn sweep_once(&self) -> Result<usize, SubmissionError> {
        let cutoff = chrono::Utc::now() - self.grace;
        let stale: Vec<RequestId> = self
            .store
            .find_stale_pending(cutoff)
            .await
            .map_err(SubmissionError::from)?;

        let mut reenqueued = 0usize;
        for request_id in stale {
            match self.queue.enqueue(request_id).await {
                Ok(()) => reenqueued += 1,
                Err(err) => {
                    tracing::warn!(%request_id, error = %err, "sweeper failed to re-enqueue");
                }
            }
        }
        Ok(reenqueued)
    }
}
