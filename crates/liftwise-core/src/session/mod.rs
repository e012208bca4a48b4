//! Signed anonymous session identities.
//!
//! Each browser gets a random user ID carried in a cookie of the form
//! `<user_id>.<hmac_hex>`, where the HMAC-SHA256 is computed over the
//! user ID with the server's session key.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "liftwise_session";

/// Minimum session key length in bytes.
pub const MIN_KEY_BYTES: usize = 32;

const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session format: {0}")]
    InvalidFormat(String),

    #[error("invalid user ID in session: {0}")]
    InvalidUserId(String),

    #[error("session HMAC verification failed")]
    HmacMismatch,

    #[error("session key must be at least {MIN_KEY_BYTES} bytes, got {0}")]
    KeyTooShort(usize),
}

/// Secret used to sign session cookies.
#[derive(Clone)]
pub struct SessionKey(Vec<u8>);

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

impl SessionKey {
    pub fn new(bytes: Vec<u8>) -> Result<Self, SessionError> {
        if bytes.len() < MIN_KEY_BYTES {
            return Err(SessionError::KeyTooShort(bytes.len()));
        }
        Ok(Self(bytes))
    }

    /// Decode a hex-encoded key as written by `liftwise init`.
    pub fn from_hex(secret_hex: &str) -> Result<Self, SessionError> {
        let bytes = hex::decode(secret_hex.trim()).map_err(|e| {
            SessionError::InvalidFormat(format!("session secret is not valid hex: {e}"))
        })?;
        Self::new(bytes)
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.0).expect("HMAC can take key of any size")
    }
}

/// Produce the signed cookie value for a user.
pub fn sign_session(key: &SessionKey, user_id: Uuid) -> String {
    let mut mac = key.mac();
    mac.update(user_id.to_string().as_bytes());
    let hmac_hex = hex::encode(mac.finalize().into_bytes());
    format!("{user_id}.{hmac_hex}")
}

/// Verify a signed cookie value and return the user it identifies.
///
/// The signature is compared in constant time.
pub fn verify_session(key: &SessionKey, value: &str) -> Result<Uuid, SessionError> {
    let (user_str, hmac_hex) = value
        .split_once('.')
        .ok_or_else(|| SessionError::InvalidFormat("expected <user_id>.<hmac>".to_string()))?;

    let user_id =
        Uuid::parse_str(user_str).map_err(|e| SessionError::InvalidUserId(e.to_string()))?;
    let provided = hex::decode(hmac_hex)
        .map_err(|e| SessionError::InvalidFormat(format!("invalid hex in hmac: {e}")))?;

    let mut mac = key.mac();
    mac.update(user_str.as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| SessionError::HmacMismatch)?;

    Ok(user_id)
}

/// Find the session cookie in a `Cookie` request header.
pub fn session_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// `Set-Cookie` header value carrying a signed session.
pub fn session_set_cookie(signed: &str) -> String {
    format!(
        "{SESSION_COOKIE}={signed}; Path=/; HttpOnly; SameSite=Lax; Max-Age={COOKIE_MAX_AGE_SECS}"
    )
}
