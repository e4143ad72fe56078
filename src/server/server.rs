use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_mysql::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub session_service: Arc<dyn SessionService>,
    pub user_service: Arc<dyn UserService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let backends = [
            settings.auth.backend.as_str(),
            settings.session.backend.as_str(),
            settings.user.backend.as_str(),
        ];
        let pool = if backends.contains(&"real") {
            Some(Pool::<MySql>::connect(&settings.database.dsn).await?)
        } else {
            None
        };

        let reissue_policy = match settings.auth.reissue.as_str() {
            "access-only" => ReissuePolicy::AccessOnly,
            "rotate-both" => ReissuePolicy::RotateBoth,
            other => return Err(anyhow!("Unknown reissue policy: {}", other)),
        };

        let auth_service: Arc<dyn AuthService> = match settings.auth.backend.as_str() {
            "fake" => Arc::new(FakeAuthService::new()),
            "real" => {
                let pool = pool
                    .clone()
                    .ok_or_else(|| anyhow!("auth backend requires a database pool"))?;

                let access_key = std::env::var("ACCESS_TOKEN_KEY")
                    .unwrap_or_else(|_| "my-dev-access-key".to_string())
                    .into_bytes();
                let refresh_key = std::env::var("REFRESH_TOKEN_KEY")
                    .unwrap_or_else(|_| "my-dev-refresh-key".to_string())
                    .into_bytes();
                let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
                    issuer: settings.auth.issuer.clone(),
                    access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
                    refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_secs),
                    access_key,
                    refresh_key,
                }));

                let auth_repo: Arc<dyn AuthRepo> = Arc::new(MySqlAuthRepo::new(pool.clone()));
                let user_repo: Arc<dyn UserRepo> = Arc::new(MySqlUserRepo::new(pool.clone()));
                let tx_manager: Arc<dyn TxManager> = Arc::new(MySqlTxManager::new(pool));
                let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);

                Arc::new(RealAuthService::new(
                    auth_repo,
                    user_repo,
                    credential_hasher,
                    token_codec,
                    tx_manager,
                    reissue_policy,
                ))
            }
            other => return Err(anyhow!("Unknown auth backend: {}", other)),
        };

        let session_service: Arc<dyn SessionService> = match settings.session.backend.as_str() {
            "fake" => Arc::new(FakeSessionService::new()),
            "real" => {
                let pool = pool
                    .clone()
                    .ok_or_else(|| anyhow!("session backend requires a database pool"))?;
                let session_repo: Arc<dyn SessionRepo> = Arc::new(MySqlSessionRepo::new(pool));
                Arc::new(RealSessionService::new(
                    session_repo,
                    Duration::from_secs(settings.session.ttl_secs),
                ))
            }
            other => return Err(anyhow!("Unknown session backend: {}", other)),
        };

        let user_service: Arc<dyn UserService> = match settings.user.backend.as_str() {
            "fake" => Arc::new(FakeUserService::new()),
            "real" => {
                let pool = pool
                    .clone()
                    .ok_or_else(|| anyhow!("user backend requires a database pool"))?;
                let user_repo: Arc<dyn UserRepo> = Arc::new(MySqlUserRepo::new(pool));
                Arc::new(RealUserService::new(user_repo))
            }
            other => return Err(anyhow!("Unknown user backend: {}", other)),
        };

        Ok(Server {
            auth_service,
            session_service,
            user_service,
            pool,
        })
    }

    /// Wire a server directly from services; used by tests.
    pub fn with_services(
        auth_service: Arc<dyn AuthService>,
        session_service: Arc<dyn SessionService>,
        user_service: Arc<dyn UserService>,
    ) -> Self {
        Server {
            auth_service,
            session_service,
            user_service,
            pool: None,
        }
    }

    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
