//! Credential and session authorization: password hashing, token digests,
//! and the access-token check every file operation passes through.

mod gate;
pub mod tokens;

pub use gate::AuthSession;
pub use tokens::{Claims, TokenError, TokenKind, TokenSigner};

use std::num::NonZeroU32;

use chrono::Utc;
use ring::rand::SecureRandom;
use ring::{digest, pbkdf2, rand};
use thiserror::Error;

use crate::storage::models::{RotateOutcome, SessionRecord};
use crate::storage::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),
    #[error("Session revoked or missing")]
    SessionRevoked,
    #[error("Session not found")]
    SessionNotFound,
    #[error("Refresh token mismatch")]
    RefreshMismatch,
    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

/// The authenticated (owner, session) pair extracted from a valid access
/// token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub owner_id: String,
    pub session_id: String,
}

/// Credentials issued on sign-in.
#[derive(Debug)]
pub struct NewSession {
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: String,
}

/// Replacement credentials issued on rotation. The session id is unchanged.
#[derive(Debug)]
pub struct RotatedSession {
    pub access_token: String,
    pub refresh_token: String,
}

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;

/// Generate a per-user random salt, hex-encoded.
pub fn new_salt() -> String {
    let rng = rand::SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).expect("system RNG unavailable");
    hex::encode(salt)
}

/// PBKDF2-HMAC-SHA256 digest of a password under the given salt,
/// hex-encoded.
pub fn hash_password(password: &str, salt_hex: &str) -> String {
    let salt = hex::decode(salt_hex).unwrap_or_default();
    let mut out = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        NonZeroU32::new(PBKDF2_ITERATIONS).expect("iteration count is non-zero"),
        &salt,
        password.as_bytes(),
        &mut out,
    );
    hex::encode(out)
}

/// Constant-time password check against a stored digest.
pub fn verify_password(password: &str, salt_hex: &str, stored_hex: &str) -> bool {
    let salt = match hex::decode(salt_hex) {
        Ok(s) => s,
        Err(_) => return false,
    };
    let stored = match hex::decode(stored_hex) {
        Ok(s) => s,
        Err(_) => return false,
    };
    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        NonZeroU32::new(PBKDF2_ITERATIONS).expect("iteration count is non-zero"),
        &salt,
        password.as_bytes(),
        &stored,
    )
    .is_ok()
}

/// One-way digest of a refresh token for at-rest storage. A database
/// compromise yields digests that cannot be replayed as tokens.
pub fn refresh_token_digest(token: &str) -> String {
    hex::encode(digest::digest(&digest::SHA256, token.as_bytes()))
}

/// Check an identity id: at most 36 chars, either a phone number (optional
/// leading `+`, 10-15 digits) or an email shape.
pub fn validate_identity_id(id: &str) -> bool {
    if id.is_empty() || id.len() > 36 {
        return false;
    }

    let digits = id.strip_prefix('+').unwrap_or(id);
    let is_phone =
        (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());

    let is_email = match id.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !id.chars().any(char::is_whitespace)
        }
        None => false,
    };

    is_phone || is_email
}

/// Check credentials and open a new device session: fresh session id, a
/// refresh token whose digest is the only thing persisted, and an access
/// token that lives purely in the response.
pub fn sign_in(
    db: &Database,
    signer: &TokenSigner,
    id: &str,
    password: &str,
    user_agent: Option<String>,
    device_name: Option<String>,
) -> Result<NewSession, AuthError> {
    // Same failure whether the id is unknown or the password is wrong.
    let user = match db.get_user(id)? {
        Some(u) if verify_password(password, &u.salt, &u.password_hash) => u,
        _ => return Err(AuthError::InvalidCredentials),
    };

    let session_id = uuid::Uuid::new_v4().to_string();
    let refresh_token = signer.sign_refresh(&user.id, &session_id);
    let now = Utc::now();

    db.put_session(&SessionRecord {
        session_id: session_id.clone(),
        owner_id: user.id.clone(),
        refresh_token_hash: refresh_token_digest(&refresh_token),
        user_agent,
        device_name,
        created_at: now,
        last_used_at: now,
        revoked_at: None,
    })?;

    let access_token = signer.sign_access(&user.id, &session_id);

    Ok(NewSession {
        access_token,
        refresh_token,
        session_id,
    })
}

/// Exchange a refresh token for a fresh access/refresh pair. The
/// replacement is signed before the rotation commits, so the conditional
/// update that stores its digest is the same one that kills the presented
/// token. Single-shot: the old token is dead even if this result never
/// reaches the caller.
pub fn refresh(
    db: &Database,
    signer: &TokenSigner,
    presented: &str,
) -> Result<RotatedSession, AuthError> {
    let claims = signer.verify(presented, TokenKind::Refresh)?;

    let refresh_token = signer.sign_refresh(&claims.sub, &claims.sid);
    let outcome = db.rotate_session(
        &claims.sid,
        &refresh_token_digest(presented),
        &refresh_token_digest(&refresh_token),
    )?;

    match outcome {
        RotateOutcome::Rotated => Ok(RotatedSession {
            access_token: signer.sign_access(&claims.sub, &claims.sid),
            refresh_token,
        }),
        RotateOutcome::Mismatch => Err(AuthError::RefreshMismatch),
        RotateOutcome::NotFound => Err(AuthError::SessionNotFound),
    }
}

/// Validate a bearer access token: cryptographic check first, then the
/// live-session lookup. A revoked or vanished session fails even while the
/// token itself is still within its expiry.
pub fn validate_access(
    db: &Database,
    signer: &TokenSigner,
    token: &str,
) -> Result<AuthContext, AuthError> {
    let claims = signer.verify(token, TokenKind::Access)?;

    match db.get_session(&claims.sid)? {
        Some(session) if !session.is_revoked() => Ok(AuthContext {
            owner_id: claims.sub,
            session_id: claims.sid,
        }),
        _ => Err(AuthError::SessionRevoked),
    }
}
