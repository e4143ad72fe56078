use crate::application_impl::auth_service_fake::fake_user_id;
use crate::application_port::{AuthError, SessionAuth, SessionService, StartedSession};
use crate::domain_model::{SessionKey, UserId};
use chrono::{Duration, Utc};

#[derive(Debug)]
pub struct FakeSessionService;

impl FakeSessionService {
    pub fn new() -> Self {
        Self
    }
}

// Stateless fake: any key carrying the expected prefix authenticates as
// the user named after it, anything else is unknown.
#[async_trait::async_trait]
impl SessionService for FakeSessionService {
    async fn start_session(&self, user_id: UserId) -> Result<StartedSession, AuthError> {
        Ok(StartedSession {
            key: SessionKey(format!("fake-session:{}", user_id)),
            expires_at: Utc::now() + Duration::days(7),
        })
    }

    async fn authenticate(&self, key: Option<String>) -> Result<SessionAuth, AuthError> {
        let key = key.ok_or(AuthError::MissingCredential)?;

        if let Some(suffix) = key.strip_prefix("fake-session:") {
            let user_id = suffix
                .parse::<UserId>()
                .unwrap_or_else(|_| fake_user_id(suffix));
            Ok(SessionAuth {
                user_id,
                key: SessionKey(key),
                expires_at: Utc::now() + Duration::days(7),
            })
        } else {
            Err(AuthError::SessionNotFound)
        }
    }
}
