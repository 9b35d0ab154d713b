//! Job Queue (spec §4.3, component C3): durable at-least-once delivery of a
//! job keyed by `generationRequestId`. `enqueue` is idempotent on that id —
//! a second enqueue for an in-flight or already-terminal request is a
//! no-op, matching P2. Every dequeue grants a time-boxed lease
//! ([`LEASE_SECONDS`]); a job whose lease expires before `complete`/`fail`
//! is called (worker crash, process kill) is reclaimed back onto the ready
//! queue rather than lost, so "at-least-once" holds even across a dead
//! worker.

mod backoff;
mod fake;
mod model;
mod redis_queue;

pub use backoff::backoff_for_attempt;
pub use fake::FakeQueue;
pub use model::Job;
pub use model::RetryOutcome;
pub use redis_queue::RedisQueue;

use async_trait::async_trait;
use serenity_core::RequestId;

/// Default retry policy (spec §4.3/§6): 3 attempts, exponential backoff
/// starting at 30s.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const BACKOFF_BASE_SECONDS: u64 = 30;
pub const COMPLETED_TTL_SECONDS: i64 = 24 * 60 * 60;
pub const FAILED_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
/// How long a dequeued job may stay in flight before it's considered
/// abandoned and reclaimed. Comfortably longer than the worst case single
/// attempt: script + voice generation, the 8-minute Veo poll cap
/// (`VEO_POLL_INTERVAL * VEO_MAX_POLLS` in `serenity-worker`), and compose.
pub const LEASE_SECONDS: i64 = 15 * 60;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue transport error: {0}")]
    Transport(String),
    #[error("job for request {0} not found")]
    JobNotFound(RequestId),
}

/// Durable job queue abstraction. Implementations: [`RedisQueue`] for
/// production, [`FakeQueue`] for tests — matching the teacher's pattern of
/// narrow ports with an in-memory test double rather than mocking the
/// entire client.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Idempotent: a second call with the same `request_id` while a job is
    /// pending, in flight, or within its retention window is a no-op.
    async fn enqueue(&self, request_id: RequestId) -> Result<(), QueueError>;

    /// Pulls the next ready job, if any, incrementing its attempt counter.
    async fn dequeue(&self) -> Result<Option<Job>, QueueError>;

    /// Marks a job permanently done. Retained for `COMPLETED_TTL_SECONDS`
    /// for inspection, then eligible for GC.
    async fn complete(&self, job: &Job) -> Result<(), QueueError>;

    /// Reports a failed attempt. Returns whether the job will be retried
    /// (scheduled with exponential backoff) or has exhausted
    /// `max_attempts` — in which case the caller (the pipeline worker) is
    /// responsible for marking the underlying request `failed` (§7).
    async fn fail(&self, job: Job, error: &str) -> Result<RetryOutcome, QueueError>;

    /// Reports a permanent failure: bypasses the retry/backoff schedule and
    /// marks the job done-with-error on the first attempt, for errors the
    /// caller has classified non-transient (spec §4.6 step 1, §7 "terminal
    /// on first attempt").
    async fn fail_immediately(&self, job: Job, error: &str) -> Result<(), QueueError>;

    /// Moves any delayed (backed-off) jobs whose wait has elapsed back onto
    /// the ready queue. Production callers run this on a short interval;
    /// [`FakeQueue`] applies it synchronously within `dequeue`.
    async fn promote_delayed(&self) -> Result<(), QueueError>;
}
