use crate::application_port::{
    AccessToken, AuthError, AuthOutcome, AuthService, AuthTokens, CredentialHasher, LoginInput,
    LoginResult, RefreshToken, ReissuePolicy, ReissuedTokens, SignupInput, TokenCodec,
};
use crate::domain_model::{Principal, UserId};
use crate::domain_port::{AuthRepo, TxManager, UserRepo};
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use futures_util::future::try_join;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

pub struct Argon2PasswordHasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::InternalError(format!("verify error: {}", e))),
        }
    }
}

/// Keys are distinct per token class so an access token can never pass
/// for a refresh token or vice versa.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub access_key: Vec<u8>,
    pub refresh_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id as string
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    exp: i64,
    iat: i64,
    iss: String,
}

fn encode_token(
    principal: &Principal,
    key: &[u8],
    ttl: Duration,
    issuer: &str,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let iat_dt = Utc::now();
    let exp_dt = iat_dt + ttl;
    let claims = Claims {
        sub: principal.user_id.to_string(),
        email: principal.email.clone(),
        exp: exp_dt.timestamp(),
        iat: iat_dt.timestamp(),
        iss: issuer.to_string(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok((token, exp_dt))
}

fn decode_token(token: &str, key: &[u8], issuer: &str) -> Result<Claims, AuthError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    v.set_issuer(&[issuer]);
    let data =
        decode::<Claims>(token, &DecodingKey::from_secret(key), &v).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;
    Ok(data.claims)
}

fn principal_from_claims(claims: Claims) -> Result<Principal, AuthError> {
    let user_id = claims
        .sub
        .parse::<UserId>()
        .map_err(|_| AuthError::TokenInvalid)?;
    Ok(Principal::new(user_id, claims.email))
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec { cfg }
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        principal: &Principal,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = encode_token(
            principal,
            &self.cfg.access_key,
            self.cfg.access_ttl,
            &self.cfg.issuer,
        )?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn issue_refresh_token(
        &self,
        principal: &Principal,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = encode_token(
            principal,
            &self.cfg.refresh_key,
            self.cfg.refresh_ttl,
            &self.cfg.issuer,
        )?;
        Ok((RefreshToken(token), exp_dt))
    }

    async fn verify_access_token(&self, token: &AccessToken) -> Result<Principal, AuthError> {
        let claims = decode_token(&token.0, &self.cfg.access_key, &self.cfg.issuer)?;
        principal_from_claims(claims)
    }

    async fn verify_refresh_token(&self, token: &RefreshToken) -> Result<Principal, AuthError> {
        let claims = decode_token(&token.0, &self.cfg.refresh_key, &self.cfg.issuer)?;
        principal_from_claims(claims)
    }
}

pub struct RealAuthService {
    auth_repo: Arc<dyn AuthRepo>,
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    tx_manager: Arc<dyn TxManager>,
    reissue_policy: ReissuePolicy,
    min_password_len: usize,
}

impl RealAuthService {
    pub fn new(
        auth_repo: Arc<dyn AuthRepo>,
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        tx_manager: Arc<dyn TxManager>,
        reissue_policy: ReissuePolicy,
    ) -> Self {
        Self {
            auth_repo,
            user_repo,
            credential_hasher,
            token_codec,
            tx_manager,
            reissue_policy,
            min_password_len: 6,
        }
    }

    fn validate_signup(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let mut parts = email.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        match parts.next() {
            Some(domain) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {}
            _ => return Err(AuthError::Validation("invalid email".to_string())),
        }
        if password.len() < self.min_password_len {
            return Err(AuthError::Validation("password too short".to_string()));
        }
        Ok(())
    }

    #[inline]
    fn new_user_id() -> UserId {
        UserId(Uuid::new_v4())
    }

    async fn check_credentials(
        &self,
        request: LoginInput,
    ) -> Result<crate::domain_port::AuthCredentialsRecord, AuthError> {
        let LoginInput { email, password } = request;

        let rec = self
            .auth_repo
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !rec.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(rec)
    }

    async fn issue_pair(&self, principal: &Principal) -> Result<AuthTokens, AuthError> {
        // The two signings have no ordering dependency; run them
        // concurrently and join.
        let ((access_token, access_exp), (refresh_token, refresh_exp)) = try_join(
            self.token_codec.issue_access_token(principal),
            self.token_codec.issue_refresh_token(principal),
        )
        .await?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError> {
        let SignupInput { email, password } = request;

        self.validate_signup(&email, &password)?;

        if self.user_repo.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let user_id = Self::new_user_id();

        self.user_repo
            .create_in_tx(tx.as_mut(), user_id, &email)
            .await?;

        self.auth_repo
            .create_credentials_in_tx(tx.as_mut(), user_id, &email, &password_hash)
            .await?;

        tx.commit()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(user_id)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let rec = self.check_credentials(request).await?;

        let principal = Principal::new(rec.user_id, Some(rec.email));
        let tokens = self.issue_pair(&principal).await?;

        Ok(LoginResult {
            user_id: rec.user_id,
            tokens,
        })
    }

    async fn verify_credentials(&self, request: LoginInput) -> Result<UserId, AuthError> {
        let rec = self.check_credentials(request).await?;
        Ok(rec.user_id)
    }

    async fn authenticate(
        &self,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<AuthOutcome, AuthError> {
        // Both cookies must be present before verification even starts.
        let access_token = access_token.ok_or(AuthError::MissingCredential)?;
        let refresh_token = refresh_token.ok_or(AuthError::MissingCredential)?;

        match self
            .token_codec
            .verify_access_token(&AccessToken(access_token))
            .await
        {
            Ok(principal) => return Ok(AuthOutcome::Authenticated { principal }),
            Err(cause) => {
                // Expiry and forgery both fall through to the refresh
                // token; only the log distinguishes them.
                debug!("access token rejected, trying refresh: {}", cause);
            }
        }

        let principal = self
            .token_codec
            .verify_refresh_token(&RefreshToken(refresh_token))
            .await?;

        let tokens = match self.reissue_policy {
            ReissuePolicy::AccessOnly => {
                let (access_token, access_exp) =
                    self.token_codec.issue_access_token(&principal).await?;
                ReissuedTokens {
                    access_token,
                    access_token_expires_at: access_exp,
                    refresh_token: None,
                    refresh_token_expires_at: None,
                }
            }
            ReissuePolicy::RotateBoth => {
                let pair = self.issue_pair(&principal).await?;
                ReissuedTokens {
                    access_token: pair.access_token,
                    access_token_expires_at: pair.access_token_expires_at,
                    refresh_token: Some(pair.refresh_token),
                    refresh_token_expires_at: Some(pair.refresh_token_expires_at),
                }
            }
        };

        Ok(AuthOutcome::AuthenticatedAndReissued { principal, tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::User;
    use crate::domain_port::{AuthCredentialsRecord, AuthRepo, StorageTx, UserRepo};
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn test_jwt_config() -> JwtConfig {
        JwtConfig {
            issuer: "gatehouse.test".to_string(),
            access_ttl: Duration::from_secs(30 * 60),
            refresh_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            access_key: b"test-access-key".to_vec(),
            refresh_key: b"test-refresh-key".to_vec(),
        }
    }

    fn test_principal() -> Principal {
        Principal::new(
            UserId(Uuid::new_v4()),
            Some("alice@example.com".to_string()),
        )
    }

    /// Mint a token with an arbitrary expiry, bypassing the codec's TTL
    /// config. Default validation leeway is 60s, so expired tests place
    /// exp well in the past.
    fn mint_with_exp(principal: &Principal, key: &[u8], issuer: &str, exp: DateTime<Utc>) -> String {
        let claims = Claims {
            sub: principal.user_id.to_string(),
            email: principal.email.clone(),
            exp: exp.timestamp(),
            iat: Utc::now().timestamp(),
            iss: issuer.to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key),
        )
        .unwrap()
    }

    struct NoopTx;

    #[async_trait::async_trait]
    impl<'t> StorageTx<'t> for NoopTx {
        async fn commit(self: Box<Self>) -> anyhow::Result<()> {
            Ok(())
        }
        async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct NoopTxManager;

    #[async_trait::async_trait]
    impl TxManager for NoopTxManager {
        async fn begin<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>> {
            Ok(Box::new(NoopTx))
        }
    }

    #[derive(Default)]
    struct InMemoryUserRepo {
        users: Mutex<HashMap<UserId, User>>,
    }

    #[async_trait::async_trait]
    impl UserRepo for InMemoryUserRepo {
        async fn create_in_tx<'t>(
            &self,
            _tx: &mut dyn StorageTx<'t>,
            user_id: UserId,
            email: &str,
        ) -> Result<(), AuthError> {
            self.users.lock().unwrap().insert(
                user_id,
                User {
                    user_id,
                    email: email.to_string(),
                    is_active: true,
                    created_at: Utc::now(),
                },
            );
            Ok(())
        }

        async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
            Ok(self.users.lock().unwrap().get(&user_id).cloned())
        }

        async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .any(|u| u.email == email))
        }
    }

    #[derive(Default)]
    struct InMemoryAuthRepo {
        creds: Mutex<HashMap<String, AuthCredentialsRecord>>,
    }

    #[async_trait::async_trait]
    impl AuthRepo for InMemoryAuthRepo {
        async fn create_credentials_in_tx<'t>(
            &self,
            _tx: &mut dyn StorageTx<'t>,
            user_id: UserId,
            email: &str,
            password_hash: &str,
        ) -> Result<(), AuthError> {
            self.creds.lock().unwrap().insert(
                email.to_string(),
                AuthCredentialsRecord {
                    user_id,
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                    is_active: true,
                    created_at: Utc::now(),
                },
            );
            Ok(())
        }

        async fn get_by_email(
            &self,
            email: &str,
        ) -> Result<Option<AuthCredentialsRecord>, AuthError> {
            Ok(self.creds.lock().unwrap().get(email).cloned())
        }
    }

    fn service(policy: ReissuePolicy) -> RealAuthService {
        RealAuthService::new(
            Arc::new(InMemoryAuthRepo::default()),
            Arc::new(InMemoryUserRepo::default()),
            Arc::new(Argon2PasswordHasher),
            Arc::new(JwtHs256Codec::new(test_jwt_config())),
            Arc::new(NoopTxManager),
            policy,
        )
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hasher = Argon2PasswordHasher;
        let hash = hasher.hash_password("hunter42").await.unwrap();
        assert!(hasher.verify_password("hunter42", &hash).await.unwrap());
        assert!(!hasher.verify_password("hunter43", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn access_token_round_trip() {
        let codec = JwtHs256Codec::new(test_jwt_config());
        let principal = test_principal();
        let (token, exp) = codec.issue_access_token(&principal).await.unwrap();
        assert!(exp > Utc::now());

        let decoded = codec.verify_access_token(&token).await.unwrap();
        assert_eq!(decoded, principal);
    }

    #[tokio::test]
    async fn refresh_verifier_rejects_access_token() {
        let codec = JwtHs256Codec::new(test_jwt_config());
        let principal = test_principal();
        let (token, _) = codec.issue_access_token(&principal).await.unwrap();

        let err = codec
            .verify_refresh_token(&RefreshToken(token.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn expired_token_reported_as_expired() {
        let cfg = test_jwt_config();
        let codec = JwtHs256Codec::new(cfg.clone());
        let principal = test_principal();
        let stale = mint_with_exp(
            &principal,
            &cfg.access_key,
            &cfg.issuer,
            Utc::now() - chrono::Duration::minutes(5),
        );

        let err = codec
            .verify_access_token(&AccessToken(stale))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let codec = JwtHs256Codec::new(test_jwt_config());
        let err = codec
            .verify_access_token(&AccessToken("not-a-jwt".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn signup_then_login_issues_token_pair() {
        let svc = service(ReissuePolicy::AccessOnly);
        let user_id = svc
            .signup(SignupInput {
                email: "alice@example.com".to_string(),
                password: "hunter42".to_string(),
            })
            .await
            .unwrap();

        let result = svc
            .login(LoginInput {
                email: "alice@example.com".to_string(),
                password: "hunter42".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result.user_id, user_id);

        let codec = JwtHs256Codec::new(test_jwt_config());
        let principal = codec
            .verify_access_token(&result.tokens.access_token)
            .await
            .unwrap();
        assert_eq!(principal.user_id, user_id);
        assert_eq!(principal.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_email() {
        let svc = service(ReissuePolicy::AccessOnly);
        let input = SignupInput {
            email: "alice@example.com".to_string(),
            password: "hunter42".to_string(),
        };
        svc.signup(input.clone()).await.unwrap();

        let err = svc.signup(input).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn signup_validates_input() {
        let svc = service(ReissuePolicy::AccessOnly);

        let err = svc
            .signup(SignupInput {
                email: "not-an-email".to_string(),
                password: "hunter42".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        let err = svc
            .signup(SignupInput {
                email: "alice@example.com".to_string(),
                password: "short".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn login_with_wrong_password_fails() {
        let svc = service(ReissuePolicy::AccessOnly);
        svc.signup(SignupInput {
            email: "alice@example.com".to_string(),
            password: "hunter42".to_string(),
        })
        .await
        .unwrap();

        let err = svc
            .login(LoginInput {
                email: "alice@example.com".to_string(),
                password: "hunter43".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = svc
            .login(LoginInput {
                email: "nobody@example.com".to_string(),
                password: "hunter42".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn authenticate_with_valid_access_token_is_idempotent() {
        let svc = service(ReissuePolicy::AccessOnly);
        let codec = JwtHs256Codec::new(test_jwt_config());
        let principal = test_principal();
        let (access, _) = codec.issue_access_token(&principal).await.unwrap();
        let (refresh, _) = codec.issue_refresh_token(&principal).await.unwrap();

        for _ in 0..2 {
            let outcome = svc
                .authenticate(Some(access.0.clone()), Some(refresh.0.clone()))
                .await
                .unwrap();
            match outcome {
                AuthOutcome::Authenticated { principal: got } => assert_eq!(got, principal),
                other => panic!("expected Authenticated, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn authenticate_requires_both_cookies() {
        let svc = service(ReissuePolicy::AccessOnly);
        let codec = JwtHs256Codec::new(test_jwt_config());
        let principal = test_principal();
        let (access, _) = codec.issue_access_token(&principal).await.unwrap();
        let (refresh, _) = codec.issue_refresh_token(&principal).await.unwrap();

        let err = svc.authenticate(None, Some(refresh.0)).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));

        let err = svc.authenticate(Some(access.0), None).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
    }

    #[tokio::test]
    async fn expired_access_with_valid_refresh_reissues_access_only() {
        let cfg = test_jwt_config();
        let svc = service(ReissuePolicy::AccessOnly);
        let codec = JwtHs256Codec::new(cfg.clone());
        let principal = test_principal();
        let stale = mint_with_exp(
            &principal,
            &cfg.access_key,
            &cfg.issuer,
            Utc::now() - chrono::Duration::minutes(5),
        );
        let (refresh, _) = codec.issue_refresh_token(&principal).await.unwrap();

        let outcome = svc
            .authenticate(Some(stale), Some(refresh.0))
            .await
            .unwrap();
        match outcome {
            AuthOutcome::AuthenticatedAndReissued {
                principal: got,
                tokens,
            } => {
                assert_eq!(got, principal);
                assert!(tokens.refresh_token.is_none());
                let decoded = codec
                    .verify_access_token(&tokens.access_token)
                    .await
                    .unwrap();
                assert_eq!(decoded, principal);
            }
            other => panic!("expected reissue, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn expired_access_with_valid_refresh_can_rotate_both() {
        let cfg = test_jwt_config();
        let svc = service(ReissuePolicy::RotateBoth);
        let codec = JwtHs256Codec::new(cfg.clone());
        let principal = test_principal();
        let stale = mint_with_exp(
            &principal,
            &cfg.access_key,
            &cfg.issuer,
            Utc::now() - chrono::Duration::minutes(5),
        );
        let (refresh, _) = codec.issue_refresh_token(&principal).await.unwrap();

        let outcome = svc
            .authenticate(Some(stale), Some(refresh.0))
            .await
            .unwrap();
        match outcome {
            AuthOutcome::AuthenticatedAndReissued { tokens, .. } => {
                let rotated = tokens.refresh_token.expect("refresh token rotated");
                let decoded = codec.verify_refresh_token(&rotated).await.unwrap();
                assert_eq!(decoded, principal);
            }
            other => panic!("expected reissue, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn both_tokens_expired_fails() {
        let cfg = test_jwt_config();
        let svc = service(ReissuePolicy::AccessOnly);
        let principal = test_principal();
        let past = Utc::now() - chrono::Duration::minutes(5);
        let stale_access = mint_with_exp(&principal, &cfg.access_key, &cfg.issuer, past);
        let stale_refresh = mint_with_exp(&principal, &cfg.refresh_key, &cfg.issuer, past);

        let err = svc
            .authenticate(Some(stale_access), Some(stale_refresh))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn forged_refresh_token_fails() {
        let cfg = test_jwt_config();
        let svc = service(ReissuePolicy::AccessOnly);
        let principal = test_principal();
        let stale = mint_with_exp(
            &principal,
            &cfg.access_key,
            &cfg.issuer,
            Utc::now() - chrono::Duration::minutes(5),
        );
        let forged = mint_with_exp(
            &principal,
            b"attacker-key",
            &cfg.issuer,
            Utc::now() + chrono::Duration::days(30),
        );

        let err = svc.authenticate(Some(stale), Some(forged)).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }
}
