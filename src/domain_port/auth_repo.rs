use crate::application_port::AuthError;
use crate::domain_model::UserId;
use crate::domain_port::StorageTx;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct AuthCredentialsRecord {
    pub user_id: UserId,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait AuthRepo: Send + Sync {
    async fn create_credentials_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        email: &str,
        password_hash: &str,
    ) -> Result<(), AuthError>;

    async fn get_by_email(&self, email: &str)
    -> Result<Option<AuthCredentialsRecord>, AuthError>;
}
