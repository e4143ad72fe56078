use crate::application_port::AuthError;
use crate::domain_model::{User, UserId};
use crate::domain_port::StorageTx;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        email: &str,
    ) -> Result<(), AuthError>;

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;
}
