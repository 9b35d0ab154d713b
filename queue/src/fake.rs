use crate::DEFAULT_MAX_ATTEMPTS;
use crate::Job;
use crate::JobQueue;
use crate::QueueError;
use crate::RetryOutcome;
use async_trait::async_trait;
use serenity_core::RequestId;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::time::Duration;
use std::time::Instant;
use tokio::sync::Mutex;

struct Meta {
    attempts_made: u32,
    max_attempts: u32,
}

struct State {
    known: HashSet<RequestId>,
    ready: VecDeque<RequestId>,
    delayed: Vec<(RequestId, Instant)>,
    meta: std::collections::HashMap<RequestId, Meta>,
}

/// In-memory [`JobQueue`] for tests: same idempotency and retry semantics
/// as [`crate::RedisQueue`] without a network dependency, matching the
/// teacher's pattern of a narrow in-memory double per external port.
pub struct FakeQueue {
    state: Mutex<State>,
}

impl Default for FakeQueue {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                known: HashSet::new(),
                ready: VecDeque::new(),
                delayed: Vec::new(),
                meta: std::collections::HashMap::new(),
            }),
        }
    }
}

impl FakeQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueue for FakeQueue {
    async fn enqueue(&self, request_id: RequestId) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        if !state.known.insert(request_id) {
            return Ok(());
        }
        state.meta.insert(
            request_id,
            Meta {
                attempts_made: 0,
                max_attempts: DEFAULT_MAX_ATTEMPTS,
            },
        );
        state.ready.push_back(request_id);
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<Job>, QueueError> {
        self.promote_delayed().await?;
        let mut state = self.state.lock().await;
        let Some(request_id) = state.ready.pop_front() else {
            return Ok(None);
        };
        let meta = state
            .meta
            .get_mut(&request_id)
            .ok_or(QueueError::JobNotFound(request_id))?;
        meta.attempts_made += 1;
        Ok(Some(Job {
            request_id,
            attempts_made: meta.attempts_made,
            max_attempts: meta.max_attempts,
        }))
    }

    async fn complete(&self, job: &Job) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        state.known.remove(&job.request_id);
        Ok(())
    }

    async fn fail(&self, job: Job, error: &str) -> Result<RetryOutcome, QueueError> {
        if job.is_final_attempt() {
            self.fail_immediately(job, error).await?;
            return Ok(RetryOutcome::AttemptsExhausted);
        }
        let mut state = self.state.lock().await;
        // Tests don't want to sleep for minutes: delay is nominal, not
        // drawn from `backoff_for_attempt`.
        state
            .delayed
            .push((job.request_id, Instant::now() + Duration::from_millis(10)));
        Ok(RetryOutcome::WillRetry)
    }

    async fn fail_immediately(&self, job: Job, _error: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        state.known.remove(&job.request_id);
        Ok(())
    }

    async fn promote_delayed(&self) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let (due, still_delayed): (Vec<_>, Vec<_>) =
            state.delayed.drain(..).partition(|(_, at)| *at <= now);
        state.delayed = still_delayed;
        for (id, _) in due {
            state.ready.push_back(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_is_idempotent() {
        let queue = FakeQueue::new();
        let id = RequestId::new();
        queue.enqueue(id).await.expect("enqueue");
        queue.enqueue(id).await.expect("enqueue again");

        let first = queue.dequeue().await.expect("dequeue").expect("a job");
        assert_eq!(first.request_id, id);
        assert!(queue.dequeue().await.expect("dequeue").is_none());
    }

    #[tokio::test]
    async fn failed_job_retries_until_attempts_exhausted() {
        let queue = FakeQueue::new();
        let id = RequestId::new();
        queue.enqueue(id).await.expect("enqueue");

        for expected_attempt in 1..=DEFAULT_MAX_ATTEMPTS {
            let job = queue.dequeue().await.expect("dequeue").expect("a job");
            assert_eq!(job.attempts_made, expected_attempt);
            let outcome = queue.fail(job, "provider timeout").await.expect("fail");
            if expected_attempt < DEFAULT_MAX_ATTEMPTS {
                assert_eq!(outcome, RetryOutcome::WillRetry);
                tokio::time::sleep(Duration::from_millis(20)).await;
            } else {
                assert_eq!(outcome, RetryOutcome::AttemptsExhausted);
            }
        }

        assert!(queue.dequeue().await.expect("dequeue").is_none());
    }

    #[tokio::test]
    async fn fail_immediately_skips_the_retry_schedule() {
        let queue = FakeQueue::new();
        let id = RequestId::new();
        queue.enqueue(id).await.expect("enqueue");

        let job = queue.dequeue().await.expect("dequeue").expect("a job");
        assert_eq!(job.attempts_made, 1);
        queue
            .fail_immediately(job, "request not found")
            .await
            .expect("fail_immediately");

        assert!(queue.dequeue().await.expect("dequeue").is_none());
    }
}
