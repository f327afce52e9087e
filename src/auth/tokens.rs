use chrono::{Duration, Utc};
use ring::hmac;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,
    #[error("Bad signature")]
    BadSignature,
    #[error("Token expired")]
    Expired,
    #[error("Wrong token kind")]
    WrongKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed token claims: the owner, the session binding both token kinds to
/// one device login, and the validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub sid: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies the two token kinds. Tokens are JWT-shaped
/// (`header.claims.signature` over base64url parts) and signed with
/// HMAC-SHA256; validity is purely cryptographic and nothing here touches
/// storage.
pub struct TokenSigner {
    key: hmac::Key,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
            access_ttl: Duration::seconds(access_ttl_secs as i64),
            refresh_ttl: Duration::seconds(refresh_ttl_secs as i64),
        }
    }

    /// Sign a short-lived access token bound to (owner, session).
    pub fn sign_access(&self, owner_id: &str, session_id: &str) -> String {
        self.sign(owner_id, session_id, TokenKind::Access, self.access_ttl)
    }

    /// Sign a long-lived refresh token bound to (owner, session).
    pub fn sign_refresh(&self, owner_id: &str, session_id: &str) -> String {
        self.sign(owner_id, session_id, TokenKind::Refresh, self.refresh_ttl)
    }

    fn sign(&self, owner_id: &str, session_id: &str, kind: TokenKind, ttl: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: owner_id.to_string(),
            sid: session_id.to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        // Build token (header.claims.signature)
        let header = base64_url_encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = base64_url_encode(
            &serde_json::to_vec(&claims).expect("claims serialization cannot fail"),
        );
        let unsigned = format!("{header}.{payload}");

        let tag = hmac::sign(&self.key, unsigned.as_bytes());
        format!("{unsigned}.{}", base64_url_encode(tag.as_ref()))
    }

    /// Verify signature, expiry and kind, returning the embedded claims.
    pub fn verify(&self, token: &str, expected_kind: TokenKind) -> Result<Claims, TokenError> {
        let mut parts = token.splitn(3, '.');
        let (header, payload, signature) = match (parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(s)) if !h.is_empty() && !p.is_empty() && !s.is_empty() => {
                (h, p, s)
            }
            _ => return Err(TokenError::Malformed),
        };

        let tag = base64_url_decode(signature).map_err(|_| TokenError::Malformed)?;
        let unsigned = format!("{header}.{payload}");
        hmac::verify(&self.key, unsigned.as_bytes(), &tag)
            .map_err(|_| TokenError::BadSignature)?;

        let claims_bytes = base64_url_decode(payload).map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| TokenError::Malformed)?;

        if claims.exp < Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        if claims.kind != expected_kind {
            return Err(TokenError::WrongKind);
        }

        Ok(claims)
    }
}

fn base64_url_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

fn base64_url_decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(data)
}
