use crate::application_port::AuthError;
use crate::domain_model::{SessionKey, UserId};
use chrono::{DateTime, Utc};

/// A freshly created session: the key goes to the client as a cookie,
/// the expiry drives the cookie's max-age.
#[derive(Debug, Clone)]
pub struct StartedSession {
    pub key: SessionKey,
    pub expires_at: DateTime<Utc>,
}

/// A validated, renewed session. `expires_at` is the post-renewal value.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    pub user_id: UserId,
    pub key: SessionKey,
    pub expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// Create one session record for one login event. Prior sessions for
    /// the same user are left alone.
    async fn start_session(&self, user_id: UserId) -> Result<StartedSession, AuthError>;
    /// Gate a request carrying a session cookie. A valid session has its
    /// expiry extended to now + the configured window before the caller
    /// proceeds.
    async fn authenticate(&self, key: Option<String>) -> Result<SessionAuth, AuthError>;
}
