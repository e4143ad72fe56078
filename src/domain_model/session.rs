use crate::domain_model::UserId;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of random bytes behind a session key. The hex encoding doubles
/// this on the wire.
pub const SESSION_KEY_BYTES: usize = 32;

/// Opaque random key identifying a server-side session. The key is the
/// only value the client ever holds; it never rotates within a session's
/// lifetime.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct SessionKey(pub String);

impl SessionKey {
    /// Draw a fresh key from the OS CSPRNG, hex-encoded for cookie-safe
    /// transport.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_KEY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        SessionKey(hex::encode(bytes))
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-side row representing one logged-in session. Expiry slides
/// forward on every successful authenticated request and is the sole
/// authority for session validity.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: i64,
    pub user_id: UserId,
    pub key: SessionKey,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
