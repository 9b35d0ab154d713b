use crate::COMPLETED_TTL_SECONDS;
use crate::DEFAULT_MAX_ATTEMPTS;
use crate::FAILED_TTL_SECONDS;
use crate::Job;
use crate::JobQueue;
use crate::LEASE_SECONDS;
use crate::QueueError;
use crate::RetryOutcome;
use crate::backoff::backoff_for_attempt;
use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serenity_core::RequestId;

const KNOWN_SET: &str = "generations:queue:known";
const READY_LIST: &str = "generations:queue:ready";
const DELAYED_ZSET: &str = "generations:queue:delayed";
/// Dequeued jobs sit here, scored by lease deadline, until `complete`/`fail`
/// removes them. [`RedisQueue::reclaim_expired_leases`] sweeps anything
/// still here past its deadline back onto `READY_LIST`.
const INFLIGHT_ZSET: &str = "generations:queue:inflight";

fn meta_key(id: RequestId) -> String {
    format!("generations:queue:meta:{id}")
}

/// Redis-backed implementation of [`JobQueue`] (spec §6: `REDIS_URL`).
/// Modeled as a plain list + delayed-retry sorted set + in-flight lease set
/// rather than pulling in a full job-queue framework, matching §9's
/// guidance to use a broker with idempotent insert, lease semantics, and
/// backoff — not roll one in process.
#[derive(Clone)]
pub struct RedisQueue {
    conn: ConnectionManager,
}

impl RedisQueue {
    pub async fn connect(redis_url: &str) -> Result<Self, QueueError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| QueueError::Transport(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl JobQueue for RedisQueue {
    async fn enqueue(&self, request_id: RequestId) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let added: bool = conn
            .sadd(KNOWN_SET, request_id.to_string())
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        if !added {
            tracing::debug!(%request_id, "enqueue is a no-op: job already known");
            return Ok(());
        }

        let meta = meta_key(request_id);
        let () = redis::pipe()
            .atomic()
            .hset(&meta, "attempts_made", 0)
            .hset(&meta, "max_attempts", DEFAULT_MAX_ATTEMPTS)
            .hset(&meta, "status", "pending")
            .rpush(READY_LIST, request_id.to_string())
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<Job>, QueueError> {
        self.promote_delayed().await?;
        self.reclaim_expired_leases().await?;

        let mut conn = self.conn.clone();
        let popped: Option<String> = conn
            .lpop(READY_LIST, None)
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        let Some(raw_id) = popped else {
            return Ok(None);
        };
        let request_id: RequestId = raw_id
            .parse::<uuid::Uuid>()
            .map_err(|e| QueueError::Transport(e.to_string()))?
            .into();

        let meta = meta_key(request_id);
        let attempts_made: u32 = conn
            .hincr(&meta, "attempts_made", 1)
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        let max_attempts: u32 = conn
            .hget(&meta, "max_attempts")
            .await
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);

        let lease_until = Utc::now().timestamp() + LEASE_SECONDS;
        let () = conn
            .zadd(INFLIGHT_ZSET, request_id.to_string(), lease_until)
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;

        Ok(Some(Job {
            request_id,
            attempts_made,
            max_attempts,
        }))
    }

    async fn complete(&self, job: &Job) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let meta = meta_key(job.request_id);
        let () = redis::pipe()
            .atomic()
            .srem(KNOWN_SET, job.request_id.to_string())
            .zrem(INFLIGHT_ZSET, job.request_id.to_string())
            .hset(&meta, "status", "completed")
            .expire(&meta, COMPLETED_TTL_SECONDS)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn fail(&self, job: Job, error: &str) -> Result<RetryOutcome, QueueError> {
        if job.is_final_attempt() {
            self.fail_immediately(job, error).await?;
            return Ok(RetryOutcome::AttemptsExhausted);
        }

        let mut conn = self.conn.clone();
        let meta = meta_key(job.request_id);
        let delay = backoff_for_attempt(job.attempts_made);
        let ready_at = (Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default())
            .timestamp();
        let () = redis::pipe()
            .atomic()
            .zrem(INFLIGHT_ZSET, job.request_id.to_string())
            .hset(&meta, "last_error", error)
            .zadd(DELAYED_ZSET, job.request_id.to_string(), ready_at)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        Ok(RetryOutcome::WillRetry)
    }

    async fn fail_immediately(&self, job: Job, error: &str) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let meta = meta_key(job.request_id);
        let () = redis::pipe()
            .atomic()
            .srem(KNOWN_SET, job.request_id.to_string())
            .zrem(INFLIGHT_ZSET, job.request_id.to_string())
            .hset(&meta, "status", "failed")
            .hset(&meta, "last_error", error)
            .expire(&meta, FAILED_TTL_SECONDS)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn promote_delayed(&self) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let now = Utc::now().timestamp();
        let due: Vec<String> = conn
            .zrangebyscore(DELAYED_ZSET, i64::MIN, now)
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        for id in due {
            let () = redis::pipe()
                .atomic()
                .zrem(DELAYED_ZSET, &id)
                .rpush(READY_LIST, &id)
                .query_async(&mut conn)
                .await
                .map_err(|e| QueueError::Transport(e.to_string()))?;
        }
        Ok(())
    }
}

impl RedisQueue {
    /// Sweeps [`INFLIGHT_ZSET`] for jobs whose lease deadline has passed —
    /// the dequeuing worker crashed or was killed before calling
    /// `complete`/`fail` — and pushes them back onto `READY_LIST` so they
    /// are redelivered (spec §4.3 "durable at-least-once").
    async fn reclaim_expired_leases(&self) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let now = Utc::now().timestamp();
        let expired: Vec<String> = conn
            .zrangebyscore(INFLIGHT_ZSET, i64::MIN, now)
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;
        for id in expired {
            tracing::warn!(request_id = %id, "reclaiming job past its lease deadline");
            let () = redis::pipe()
                .atomic()
                .zrem(INFLIGHT_ZSET, &id)
                .rpush(READY_LIST, &id)
                .query_async(&mut conn)
                .await
                .map_err(|e| QueueError::Transport(e.to_string()))?;
        }
        Ok(())
    }
}
