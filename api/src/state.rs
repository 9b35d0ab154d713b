use serenity_store::RequestStore;
use serenity_submission::SubmissionService;
use std::sync::Arc;

/// Shared application state, cloned cheaply per request handler the way
/// axum state is meant to be used — everything inside is already an `Arc`
/// or a connection-pool handle.
#[derive(Clone)]
pub struct AppState {
    pub submission: Arc<SubmissionService>,
    pub store: RequestStore,
}

impl AppState {
    pub fn new(submission: Arc<SubmissionService>, store: RequestStore) -> Self {
        Self { submission, store }
    }
}
