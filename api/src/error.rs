use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serenity_core::FieldErrors;
use serenity_submission::SubmissionError;
use serenity_store::StoreError;

/// HTTP-facing error taxonomy (spec §7). Every variant maps to exactly one
/// status code and response envelope; 500s never leak the underlying
/// message to the client, only to `tracing`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("authentication required")]
    Unauthorized,
    #[error("insufficient credits: {required} required")]
    InsufficientCredits { required: u32 },
    #[error("not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Validation(errors) => Self::Validation(errors),
            SubmissionError::InsufficientCredits { required } => {
                Self::InsufficientCredits { required }
            }
            SubmissionError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": errors.0 })))
                    .into_response()
            }
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "authentication required" })),
            )
                .into_response(),
            Self::InsufficientCredits { required } => (
                StatusCode::PAYMENT_REQUIRED,
                Json(serde_json::json!({ "error": "Insufficient credits", "required": required })),
            )
                .into_response(),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "not found" })),
            )
                .into_response(),
            Self::Internal(message) => {
                tracing::error!(error = %message, "internal error serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
