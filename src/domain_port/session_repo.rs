use crate::application_port::AuthError;
use crate::domain_model::{SessionKey, SessionRecord, UserId};
use chrono::{DateTime, Utc};

/// Store for server-side session rows. Rows are only ever touched by
/// key, so concurrent requests for different sessions never contend;
/// renewals for the same key race with last-write-wins semantics.
#[async_trait::async_trait]
pub trait SessionRepo: Send + Sync {
    async fn create(
        &self,
        user_id: UserId,
        key: &SessionKey,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionRecord, AuthError>;

    async fn find_by_key(&self, key: &SessionKey) -> Result<Option<SessionRecord>, AuthError>;

    async fn update_expiry(&self, id: i64, expires_at: DateTime<Utc>) -> Result<(), AuthError>;
}
