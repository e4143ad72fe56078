use crate::application_port::{AuthError, SessionAuth, SessionService, StartedSession};
use crate::domain_model::{SessionKey, UserId};
use crate::domain_port::SessionRepo;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

pub struct RealSessionService {
    session_repo: Arc<dyn SessionRepo>,
    ttl: Duration,
}

impl RealSessionService {
    pub fn new(session_repo: Arc<dyn SessionRepo>, ttl: Duration) -> Self {
        RealSessionService { session_repo, ttl }
    }

    fn new_expires_at(&self) -> DateTime<Utc> {
        Utc::now() + self.ttl
    }
}

#[async_trait::async_trait]
impl SessionService for RealSessionService {
    async fn start_session(&self, user_id: UserId) -> Result<StartedSession, AuthError> {
        let key = SessionKey::generate();
        let record = self
            .session_repo
            .create(user_id, &key, self.new_expires_at())
            .await?;

        Ok(StartedSession {
            key,
            expires_at: record.expires_at,
        })
    }

    async fn authenticate(&self, key: Option<String>) -> Result<SessionAuth, AuthError> {
        let key = SessionKey(key.ok_or(AuthError::MissingCredential)?);

        let record = self
            .session_repo
            .find_by_key(&key)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if record.expires_at < Utc::now() {
            return Err(AuthError::SessionExpired);
        }

        // Sliding expiration: extend before the caller proceeds. The key
        // itself never rotates. Concurrent renewals for the same key race
        // with last-write-wins, which only ever extends validity.
        let expires_at = self.new_expires_at();
        self.session_repo
            .update_expiry(record.id, expires_at)
            .await?;

        Ok(SessionAuth {
            user_id: record.user_id,
            key: record.key,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::SessionRecord;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    #[derive(Default)]
    struct InMemorySessionRepo {
        rows: Mutex<HashMap<i64, SessionRecord>>,
        next_id: Mutex<i64>,
    }

    impl InMemorySessionRepo {
        fn expiry_of(&self, id: i64) -> DateTime<Utc> {
            self.rows.lock().unwrap()[&id].expires_at
        }
    }

    #[async_trait::async_trait]
    impl SessionRepo for InMemorySessionRepo {
        async fn create(
            &self,
            user_id: UserId,
            key: &SessionKey,
            expires_at: DateTime<Utc>,
        ) -> Result<SessionRecord, AuthError> {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let record = SessionRecord {
                id: *next_id,
                user_id,
                key: key.clone(),
                expires_at,
                created_at: Utc::now(),
            };
            self.rows.lock().unwrap().insert(record.id, record.clone());
            Ok(record)
        }

        async fn find_by_key(&self, key: &SessionKey) -> Result<Option<SessionRecord>, AuthError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|r| &r.key == key)
                .cloned())
        }

        async fn update_expiry(
            &self,
            id: i64,
            expires_at: DateTime<Utc>,
        ) -> Result<(), AuthError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .get_mut(&id)
                .ok_or(AuthError::Store("no such row".to_string()))?;
            row.expires_at = expires_at;
            Ok(())
        }
    }

    fn user() -> UserId {
        UserId(Uuid::new_v4())
    }

    #[tokio::test]
    async fn start_session_creates_record_with_full_window() {
        let repo = Arc::new(InMemorySessionRepo::default());
        let svc = RealSessionService::new(repo.clone(), WEEK);

        let started = svc.start_session(user()).await.unwrap();
        let stored = repo.find_by_key(&started.key).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, started.expires_at);

        let window = started.expires_at - Utc::now();
        assert!(window > chrono::Duration::days(6));
        assert!(window <= chrono::Duration::days(7));
    }

    #[tokio::test]
    async fn each_login_gets_its_own_session() {
        let repo = Arc::new(InMemorySessionRepo::default());
        let svc = RealSessionService::new(repo.clone(), WEEK);
        let uid = user();

        let first = svc.start_session(uid).await.unwrap();
        let second = svc.start_session(uid).await.unwrap();
        assert_ne!(first.key, second.key);

        // Both sessions stay usable.
        svc.authenticate(Some(first.key.0.clone())).await.unwrap();
        svc.authenticate(Some(second.key.0.clone())).await.unwrap();
    }

    #[tokio::test]
    async fn missing_key_fails() {
        let svc = RealSessionService::new(Arc::new(InMemorySessionRepo::default()), WEEK);
        let err = svc.authenticate(None).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
    }

    #[tokio::test]
    async fn unknown_key_fails() {
        let svc = RealSessionService::new(Arc::new(InMemorySessionRepo::default()), WEEK);
        let err = svc
            .authenticate(Some(SessionKey::generate().0))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SessionNotFound));
    }

    #[tokio::test]
    async fn expired_session_fails_and_is_not_renewed() {
        let repo = Arc::new(InMemorySessionRepo::default());
        let svc = RealSessionService::new(repo.clone(), WEEK);
        let key = SessionKey::generate();

        let record = repo
            .create(user(), &key, Utc::now() + Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let err = svc.authenticate(Some(key.0)).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionExpired));
        // The stale row must not have been extended.
        assert_eq!(repo.expiry_of(record.id), record.expires_at);
    }

    #[tokio::test]
    async fn authenticated_request_slides_expiry_forward() {
        let repo = Arc::new(InMemorySessionRepo::default());
        let svc = RealSessionService::new(repo.clone(), WEEK);

        let started = svc.start_session(user()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let auth = svc.authenticate(Some(started.key.0.clone())).await.unwrap();
        assert_eq!(auth.key, started.key);
        assert!(auth.expires_at > started.expires_at);

        let window = auth.expires_at - Utc::now();
        assert!(window > chrono::Duration::days(6));

        // Renewal persisted, and expiry never moves backwards.
        let stored = repo.find_by_key(&started.key).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, auth.expires_at);

        let again = svc.authenticate(Some(started.key.0)).await.unwrap();
        assert!(again.expires_at >= auth.expires_at);
    }
}
