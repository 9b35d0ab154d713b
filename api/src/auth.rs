use crate::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serenity_core::UserId;

/// The authenticated caller. Authentication itself is an out-of-scope
/// external collaborator (spec §1): in production a gateway validates the
/// bearer token and forwards the resolved user id, the way an upstream proxy
/// sits in front of this control plane. This extractor is the seam: it reads
/// the already-validated id straight off the `Authorization: Bearer <uuid>`
/// header. Swapping in a real session/JWT lookup means replacing this type's
/// `FromRequestParts` impl only — no caller of the routes changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
        let user_id = token
            .parse::<uuid::Uuid>()
            .map_err(|_| ApiError::Unauthorized)?;
        Ok(AuthUser(UserId::from(user_id)))
    }
}
