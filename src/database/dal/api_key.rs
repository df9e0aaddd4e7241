use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::found;
use crate::database::models::api_key::ApiKey;
use crate::database::DatabaseError;

const COLUMNS: &str = "users_api_key_id, user_id, api_key, name, created_at, expires_at";

pub struct ApiKeyDal {
    pool: PgPool,
}

impl ApiKeyDal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        api_key: &str,
        name: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ApiKey, DatabaseError> {
        sqlx::query_as::<_, ApiKey>(&format!(
            "INSERT INTO users_api_key (users_api_key_id, user_id, api_key, name, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(api_key)
        .bind(name)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Constraint(msg) if msg.contains("foreign key") => {
                DatabaseError::Constraint("User not found".into())
            }
            other => other.or_constraint("API key already exists"),
        })
    }

    pub async fn find(&self, api_key: &str) -> Result<Option<ApiKey>, DatabaseError> {
        let key = sqlx::query_as::<_, ApiKey>(&format!("SELECT {COLUMNS} FROM users_api_key WHERE api_key = $1"))
            .bind(api_key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(key)
    }

    pub async fn get(&self, api_key: &str) -> Result<ApiKey, DatabaseError> {
        found(self.find(api_key).await?, "API key not found")
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<ApiKey>, DatabaseError> {
        let keys = sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {COLUMNS} FROM users_api_key WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }

    /// Delete the key, returning what was removed
    pub async fn revoke(&self, api_key: &str) -> Result<ApiKey, DatabaseError> {
        let key = sqlx::query_as::<_, ApiKey>(&format!(
            "DELETE FROM users_api_key WHERE api_key = $1 RETURNING {COLUMNS}"
        ))
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await?;
        found(key, "API key not found")
    }
}
