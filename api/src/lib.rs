//! HTTP surface for the generation control plane (spec §6).
//!
//! Only the routes the core covers live here: submission, listing, and
//! progress. Media-asset catalog, moderation/admin, and browsing endpoints
//! are out of scope (spec §1) and are not routed by this crate.

mod auth;
mod dto;
mod error;
mod routes;
mod state;

pub use auth::AuthUser;
pub use dto::GenerationResponse;
pub use dto::ListQuery;
pub use dto::PageResponse;
pub use dto::ProgressResponse;
pub use dto::SubmitGenerationBody;
pub use error::ApiError;
pub use state::AppState;

use axum::Router;
use axum::routing::get;
use axum::routing::post;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Builds the full router. `state` carries the submission service and
/// request store; callers (the `serve` binary, and this crate's own tests)
/// wire those up however they see fit — with real Postgres/Redis/S3-backed
/// ports in production, with fakes in tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::health::healthz))
        .route(
            "/api/generations",
            post(routes::generations::submit).get(routes::generations::list),
        )
        .route(
            "/api/generations/{id}/progress",
            get(routes::generations::progress),
        )
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}
