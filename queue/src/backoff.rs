use crate::BACKOFF_BASE_SECONDS;
use rand::Rng;
use std::time::Duration;

/// Exponential backoff starting at `BACKOFF_BASE_SECONDS`, with jitter to
/// avoid a thundering herd of retries landing on the provider at once.
/// `attempts_made` is 1-indexed (the attempt that just failed).
pub fn backoff_for_attempt(attempts_made: u32) -> Duration {
    let exp = 2u64.saturating_pow(attempts_made.saturating_sub(1));
    let base_secs = BACKOFF_BASE_SECONDS.saturating_mul(exp);
    let jitter = rand::thread_rng().gen_range(0.9..1.1);
    Duration::from_secs_f64(base_secs as f64 * jitter)
}
