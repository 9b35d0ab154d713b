use serenity_core::RequestId;

/// One delivery of a job to a worker. `updateProgress` in spec §4.3's job
/// handler signature is realized by the worker calling
/// `RequestStore::update_progress` directly rather than through the queue,
/// since progress is durable state the queue itself doesn't own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub request_id: RequestId,
    pub attempts_made: u32,
    pub max_attempts: u32,
}

impl Job {
    pub fn is_final_attempt(&self) -> bool {
        self.attempts_made >= self.max_attempts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    WillRetry,
    AttemptsExhausted,
}
