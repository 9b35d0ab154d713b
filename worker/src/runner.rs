use crate::pipeline::PipelineWorker;
use serenity_queue::JobQueue;
use serenity_queue::RetryOutcome;
use serenity_store::RequestStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Caps worker starts globally to `per_minute` (spec §4.3/§5 "Rate
/// limiting"), shared across every worker task in the process.
pub struct StartRateLimiter {
    per_minute: u32,
    state: Mutex<Vec<Instant>>,
}

impl StartRateLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self {
            per_minute: per_minute.max(1),
            state: Mutex::new(Vec::new()),
        }
    }

    /// Blocks until a new job start is within budget for the trailing
    /// 60-second window.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut starts = self.state.lock().await;
                let now = Instant::now();
                starts.retain(|t| now.duration_since(*t) < Duration::from_secs(60));
                if starts.len() < self.per_minute as usize {
                    starts.push(now);
                    None
                } else {
                    let oldest = starts[0];
                    Some(Duration::from_secs(60).saturating_sub(now.duration_since(oldest)))
                }
            };
            match wait {
                None => return,
                Some(duration) => tokio::time::sleep(duration).await,
            }
        }
    }
}

/// Runs `concurrency` worker loops against `queue`, each pulling one job at
/// a time and driving it through [`PipelineWorker::run_once`] (spec §4.6,
/// §5 "Pipeline Worker runs N in parallel").
pub async fn run(
    worker: Arc<PipelineWorker>,
    store: RequestStore,
    queue: Arc<dyn JobQueue>,
    concurrency: usize,
    rate_limiter: Arc<StartRateLimiter>,
) {
    let mut handles = Vec::with_capacity(concurrency);
    for worker_index in 0..concurrency.max(1) {
        let worker = Arc::clone(&worker);
        let store = store.clone();
        let queue = Arc::clone(&queue);
        let rate_limiter = Arc::clone(&rate_limiter);
        handles.push(tokio::spawn(async move {
            worker_loop(worker_index, worker, store, queue, rate_limiter).await;
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }
}

async fn worker_loop(
    worker_index: usize,
    worker: Arc<PipelineWorker>,
    store: RequestStore,
    queue: Arc<dyn JobQueue>,
    rate_limiter: Arc<StartRateLimiter>,
) {
    loop {
        let job = match queue.dequeue().await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                continue;
            }
            Err(err) => {
                tracing::error!(worker_index, error = %err, "dequeue failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        rate_limiter.acquire().await;

        let request_id = job.request_id;
        match worker.run_once(request_id).await {
            Ok(()) => {
                if let Err(err) = queue.complete(&job).await {
                    tracing::error!(%request_id, error = %err, "failed to mark job complete");
                }
            }
            Err(err) => {
                tracing::warn!(%request_id, error = %err, "pipeline attempt failed");
                if err.is_transient() {
                    match queue.fail(job, &err.to_string()).await {
                        Ok(RetryOutcome::WillRetry) => {}
                        Ok(RetryOutcome::AttemptsExhausted) => {
                            // Only this hook may mark the request `failed` (spec §7).
                            if let Err(mark_err) = store.mark_failed(request_id).await {
                                tracing::error!(%request_id, error = %mark_err, "failed to mark request failed");
                            }
                        }
                        Err(queue_err) => {
                            tracing::error!(%request_id, error = %queue_err, "failed to report job failure to queue");
                        }
                    }
                } else {
                    // Permanent error: terminal on the first attempt, no
                    // retry/backoff (spec §4.6 step 1, §7).
                    if let Err(queue_err) = queue.fail_immediately(job, &err.to_string()).await {
                        tracing::error!(%request_id, error = %queue_err, "failed to report permanent job failure to queue");
                    }
                    if let Err(mark_err) = store.mark_failed(request_id).await {
                        tracing::error!(%request_id, error = %mark_err, "failed to mark request failed");
                    }
                }
            }
        }
    }
}
