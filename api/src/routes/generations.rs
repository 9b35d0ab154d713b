use crate::auth::AuthUser;
use crate::dto::GenerationResponse;
use crate::dto::ListQuery;
use crate::dto::PageResponse;
use crate::dto::ProgressResponse;
use crate::dto::SubmitGenerationBody;
use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serenity_core::RequestId;

/// `POST /api/generations` (spec §6, §4.4).
pub async fn submit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SubmitGenerationBody>,
) -> Result<(StatusCode, Json<GenerationResponse>), ApiError> {
    let request = state
        .submission
        .submit(body.into_submission_request(user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(request.into())))
}

/// `GET /api/generations` (spec §6, owner-scoped, paginated).
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 50);
    let result = state.store.list_for_user(user_id, page, limit).await?;
    Ok(Json(result.into()))
}

/// `GET /api/generations/:id/progress` (spec §4.7, P4 ownership isolation).
pub async fn progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let request_id = RequestId::from(id);
    let request = state
        .store
        .get_owned(request_id, user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(request.into()))
}
