use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::AppState;

use super::{validate_access, AuthError};

/// Extractor gating every file route: resolves the bearer access token to
/// the owning (owner, session) pair or rejects the request.
///
/// All token and session failures collapse into one unauthorized response;
/// the distinction (malformed vs expired vs revoked) is logged, never
/// surfaced.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub owner_id: String,
    pub session_id: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Missing access token"))?;

        match validate_access(&state.db, &state.tokens, token) {
            Ok(ctx) => Ok(AuthSession {
                owner_id: ctx.owner_id,
                session_id: ctx.session_id,
            }),
            Err(AuthError::Storage(e)) => Err(ApiError::internal(e.to_string())),
            Err(e) => {
                tracing::debug!(reason = %e, "Rejected access token");
                Err(ApiError::unauthorized("Invalid access token"))
            }
        }
    }
}
