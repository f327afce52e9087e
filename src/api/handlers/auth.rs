use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson};
use crate::auth::{self, AuthError, AuthSession};
use crate::storage::models::UserRecord;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub id: String,
    pub password: String,
    #[serde(default, rename = "deviceName")]
    pub device_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn signup(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    if !auth::validate_identity_id(&req.id) {
        return Err(ApiError::bad_request(
            "id must be a phone number or email address of at most 36 characters",
        ));
    }
    if req.password.trim().is_empty() {
        return Err(ApiError::bad_request("password must not be empty"));
    }

    let salt = auth::new_salt();
    let user = UserRecord {
        id: req.id.clone(),
        password_hash: auth::hash_password(&req.password, &salt),
        salt,
        created_at: Utc::now(),
    };

    let created = state
        .db
        .create_user(&user)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if !created {
        return Err(ApiError::bad_request("User already exists"));
    }

    tracing::debug!(user_id = %req.id, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User successfully registered. Now you can login with your id and password."
                .to_string(),
        }),
    ))
}

pub async fn signin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(req): AppJson<CredentialsRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let session = auth::sign_in(
        &state.db,
        &state.tokens,
        &req.id,
        &req.password,
        user_agent,
        req.device_name,
    )
    .map_err(|e| match e {
        AuthError::Storage(e) => ApiError::internal(e.to_string()),
        _ => ApiError::unauthorized("Invalid credentials"),
    })?;

    tracing::debug!(user_id = %req.id, session_id = %session.session_id, "Signed in");

    Ok(Json(SignInResponse {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        session_id: session.session_id,
        id: req.id,
    }))
}

pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let rotated =
        auth::refresh(&state.db, &state.tokens, &req.refresh_token).map_err(|e| match e {
            AuthError::Storage(e) => ApiError::internal(e.to_string()),
            e => {
                // Rotation races are expected; superseded-token reuse looks
                // the same. Either way the caller gets one opaque 401.
                tracing::debug!(reason = %e, "Rejected refresh token");
                ApiError::unauthorized("Invalid refresh token")
            }
        })?;

    Ok(Json(RefreshResponse {
        access_token: rotated.access_token,
        refresh_token: rotated.refresh_token,
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    // Owner-scoped and idempotent: unknown or foreign session ids no-op.
    state
        .db
        .revoke_session(&session.owner_id, &session_id)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::debug!(session_id = %session_id, "Revoked session");
    Ok(StatusCode::NO_CONTENT)
}
