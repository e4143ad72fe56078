use super::util::{downcast, is_dup_key};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        email: &str,
    ) -> Result<(), AuthError> {
        let tx = downcast(tx);

        sqlx::query(
            r#"
INSERT INTO user (user_id, email, is_active)
VALUES (?, ?, ?)
"#,
        )
        .bind(user_id.0.as_bytes() as &[u8])
        .bind(email)
        .bind(true)
        .execute(tx.conn())
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::EmailTaken
            } else {
                AuthError::Store(e.to_string())
            }
        })?;

        Ok(())
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        let row_opt = sqlx::query(
            r#"
SELECT user_id, email, is_active, created_at
FROM user
WHERE user_id = ?
"#,
        )
        .bind(user_id.0.as_bytes() as &[u8])
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(format!("query user: {e}")))?;

        let Some(row) = row_opt else {
            return Ok(None);
        };

        let user_id_bytes: Vec<u8> = row
            .try_get("user_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let user_id = UserId(
            Uuid::from_slice(&user_id_bytes).map_err(|e| AuthError::Store(e.to_string()))?,
        );
        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let is_active: bool = row
            .try_get("is_active")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(Some(User {
            user_id,
            email,
            is_active,
            created_at,
        }))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM user WHERE email = ?"#)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(count > 0)
    }
}
