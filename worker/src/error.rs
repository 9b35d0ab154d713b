use serenity_compose::ComposeError;
use serenity_providers::ProviderError;
use serenity_storage::StorageError;
use serenity_store::StoreError;

/// Errors surfaced from a single pipeline attempt (spec §4.6, §7 taxonomy).
/// `is_transient` decides whether the runner schedules a retry through
/// [`serenity_queue::JobQueue::fail`] or calls
/// [`serenity_queue::JobQueue::fail_immediately`] to mark the request
/// `failed` on the first attempt (spec §4.6 step 1 "terminal on first
/// attempt").
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("generation request not found")]
    NotFound,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Timeout(String),
}

impl WorkerError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NotFound => false,
            Self::Provider(e) => e.is_transient(),
            Self::Storage(_) => true,
            Self::Compose(_) => true,
            Self::Store(_) => true,
            Self::Timeout(_) => false,
        }
    }
}
