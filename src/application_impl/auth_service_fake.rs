use crate::application_port::*;
use crate::domain_model::{Principal, UserId};
use chrono::{Duration, Utc};

#[derive(Debug)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn fake_user_id(email: &str) -> UserId {
    UserId(uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        email.as_bytes(),
    ))
}

fn fake_tokens(email: &str) -> AuthTokens {
    let now = Utc::now();
    AuthTokens {
        access_token: AccessToken(format!("fake-access-token:{}", email)),
        access_token_expires_at: now + Duration::minutes(30),
        refresh_token: RefreshToken(format!("fake-refresh-token:{}", email)),
        refresh_token_expires_at: now + Duration::days(30),
    }
}

// Minimal fake implementation for basic use only.
// Extend to simulate more error cases and configurable responses when needed.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError> {
        Ok(fake_user_id(&request.email))
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        Ok(LoginResult {
            user_id: fake_user_id(&request.email),
            tokens: fake_tokens(&request.email),
        })
    }

    async fn verify_credentials(&self, request: LoginInput) -> Result<UserId, AuthError> {
        Ok(fake_user_id(&request.email))
    }

    async fn authenticate(
        &self,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<AuthOutcome, AuthError> {
        let access_token = access_token.ok_or(AuthError::MissingCredential)?;
        let refresh_token = refresh_token.ok_or(AuthError::MissingCredential)?;

        if let Some(email) = access_token.strip_prefix("fake-access-token:") {
            return Ok(AuthOutcome::Authenticated {
                principal: Principal::new(fake_user_id(email), Some(email.to_string())),
            });
        }

        if let Some(email) = refresh_token.strip_prefix("fake-refresh-token:") {
            let tokens = fake_tokens(email);
            return Ok(AuthOutcome::AuthenticatedAndReissued {
                principal: Principal::new(fake_user_id(email), Some(email.to_string())),
                tokens: ReissuedTokens {
                    access_token: tokens.access_token,
                    access_token_expires_at: tokens.access_token_expires_at,
                    refresh_token: Some(tokens.refresh_token),
                    refresh_token_expires_at: Some(tokens.refresh_token_expires_at),
                },
            });
        }

        Err(AuthError::TokenInvalid)
    }
}
