use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered identity (phone number or email address).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    /// PBKDF2-HMAC-SHA256 digest, hex-encoded.
    pub password_hash: String,
    /// Per-user random salt, hex-encoded.
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

/// One authenticated device/login. The session id is the stable handle
/// across refresh-token rotations; only the stored token digest changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub owner_id: String,
    /// SHA-256 digest of the current refresh token, hex-encoded. The token
    /// itself is never persisted.
    pub refresh_token_hash: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    #[serde(default)]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// A stored file. `storage_key` locates the blob inside the owner's
/// partition; it changes on replace (fresh key, pointer swap) and is never
/// reused across records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: String,
    pub owner_user_id: String,
    pub original_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    /// Hex-encoded SHA-256 of the stored bytes, computed server-side.
    pub checksum_sha256: String,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; set rows are invisible to every lookup.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Outcome of a refresh-token rotation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateOutcome {
    /// Stored digest matched; the new digest is now in place.
    Rotated,
    /// Stored digest did not match the presented token (superseded or
    /// tampered token).
    Mismatch,
    /// No live session row for this id (missing or revoked).
    NotFound,
}
