use crate::application_port::{AuthError, UserService};
use crate::domain_model::{User, UserId};
use chrono::Utc;

#[derive(Debug)]
pub struct FakeUserService;

impl FakeUserService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl UserService for FakeUserService {
    async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        Ok(User {
            user_id,
            email: format!("{}@fake.example", user_id),
            is_active: true,
            created_at: Utc::now(),
        })
    }
}
