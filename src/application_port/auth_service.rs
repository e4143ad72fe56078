use crate::domain_model::{Principal, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Internal error taxonomy for the authentication flows. The API boundary
/// collapses every authentication branch to one undifferentiated 401;
/// these variants exist so logs can still tell the branches apart.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("credential missing from request")]
    MissingCredential,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email already registered")]
    EmailTaken,
    #[error("user not found")]
    UserNotFound,
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: UserId,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Credentials minted by a silent reissue. The refresh half is only
/// present under [`ReissuePolicy::RotateBoth`].
#[derive(Debug, Clone, Serialize)]
pub struct ReissuedTokens {
    pub access_token: AccessToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: Option<RefreshToken>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

/// Whether a silent reissue rewrites the refresh token as well. Rotating
/// both lets a lightly-used refresh token extend its own lifetime
/// indefinitely, so the fixed-lifetime policy is the default.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ReissuePolicy {
    AccessOnly,
    RotateBoth,
}

/// Result of gating one request. Reissue is observable here rather than
/// only through cookie inspection.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Authenticated {
        principal: Principal,
    },
    AuthenticatedAndReissued {
        principal: Principal,
        tokens: ReissuedTokens,
    },
}

impl AuthOutcome {
    pub fn principal(&self) -> &Principal {
        match self {
            AuthOutcome::Authenticated { principal } => principal,
            AuthOutcome::AuthenticatedAndReissued { principal, .. } => principal,
        }
    }
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        principal: &Principal,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    async fn issue_refresh_token(
        &self,
        principal: &Principal,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError>;
    async fn verify_access_token(&self, token: &AccessToken) -> Result<Principal, AuthError>;
    async fn verify_refresh_token(&self, token: &RefreshToken) -> Result<Principal, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    /// Check a password against the stored credential without issuing
    /// anything. Session sign-in builds on this.
    async fn verify_credentials(&self, request: LoginInput) -> Result<UserId, AuthError>;
    /// Gate a request carrying the dual-token cookie pair. Steps run in
    /// order: both cookies must be present, the access token is tried
    /// first, the refresh token only as fallback. Consults no store.
    async fn authenticate(
        &self,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<AuthOutcome, AuthError>;
}
