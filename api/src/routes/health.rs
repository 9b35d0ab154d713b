use axum::http::StatusCode;

/// `GET /healthz` (SPEC_FULL §B): liveness probe, ambient infrastructure
/// rather than a named module.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
