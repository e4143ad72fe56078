use crate::application_port::{AuthError, UserService};
use crate::domain_model::{User, UserId};
use crate::domain_port::UserRepo;
use std::sync::Arc;

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
}

impl RealUserService {
    pub fn new(user_repo: Arc<dyn UserRepo>) -> RealUserService {
        RealUserService { user_repo }
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.user_repo
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
