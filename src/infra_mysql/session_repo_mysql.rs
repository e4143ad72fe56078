use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

pub struct MySqlSessionRepo {
    pool: MySqlPool,
}

impl MySqlSessionRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlSessionRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<SessionRecord, AuthError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        let user_id_bytes: Vec<u8> = row
            .try_get("user_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let user_id = UserId(
            Uuid::from_slice(&user_id_bytes).map_err(|e| AuthError::Store(e.to_string()))?,
        );

        let key: String = row
            .try_get("session_key")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let expires_at: DateTime<Utc> = row
            .try_get("expires_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(SessionRecord {
            id,
            user_id,
            key: SessionKey(key),
            expires_at,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl SessionRepo for MySqlSessionRepo {
    async fn create(
        &self,
        user_id: UserId,
        key: &SessionKey,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionRecord, AuthError> {
        let result = sqlx::query(
            r#"
INSERT INTO session (user_id, session_key, expires_at)
VALUES (?, ?, ?)
"#,
        )
        .bind(user_id.0.as_bytes() as &[u8])
        .bind(&key.0)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(SessionRecord {
            id: result.last_insert_id() as i64,
            user_id,
            key: key.clone(),
            expires_at,
            created_at: Utc::now(),
        })
    }

    async fn find_by_key(&self, key: &SessionKey) -> Result<Option<SessionRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, user_id, session_key, expires_at, created_at
FROM session
WHERE session_key = ?
"#,
        )
        .bind(&key.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn update_expiry(&self, id: i64, expires_at: DateTime<Utc>) -> Result<(), AuthError> {
        // Last-write-wins on purpose: concurrent renewals only ever push
        // the expiry forward.
        sqlx::query(r#"UPDATE session SET expires_at = ? WHERE id = ?"#)
            .bind(expires_at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }
}
