use sqlx::PgPool;
use uuid::Uuid;

use super::{affected, found};
use crate::database::models::api_usage::{ApiUsage, ApiUsageUpdate};
use crate::database::models::Pagination;
use crate::database::DatabaseError;

const COLUMNS: &str = "usage_id, user_id, chat_usage, invoice_usage, reset_date, created_at, updated_at";

pub struct ApiUsageDal {
    pool: PgPool,
}

impl ApiUsageDal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid) -> Result<ApiUsage, DatabaseError> {
        sqlx::query_as::<_, ApiUsage>(&format!(
            "INSERT INTO api_usage (usage_id, user_id) VALUES ($1, $2) RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Usage record already exists for this user"))
    }

    pub async fn list(&self, page: Pagination) -> Result<Vec<ApiUsage>, DatabaseError> {
        let (skip, limit) = page.bounds();
        let rows = sqlx::query_as::<_, ApiUsage>(&format!(
            "SELECT {COLUMNS} FROM api_usage ORDER BY created_at OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, usage_id: Uuid) -> Result<ApiUsage, DatabaseError> {
        let row = sqlx::query_as::<_, ApiUsage>(&format!("SELECT {COLUMNS} FROM api_usage WHERE usage_id = $1"))
            .bind(usage_id)
            .fetch_optional(&self.pool)
            .await?;
        found(row, "Usage record not found")
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<ApiUsage>, DatabaseError> {
        let row = sqlx::query_as::<_, ApiUsage>(&format!("SELECT {COLUMNS} FROM api_usage WHERE user_id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_by_user(&self, user_id: Uuid) -> Result<ApiUsage, DatabaseError> {
        found(self.find_by_user(user_id).await?, "Usage record not found")
    }

    pub async fn get_or_create(&self, user_id: Uuid) -> Result<ApiUsage, DatabaseError> {
        // A no-op update on conflict makes RETURNING yield the existing row
        let row = sqlx::query_as::<_, ApiUsage>(&format!(
            "INSERT INTO api_usage (usage_id, user_id) VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("User not found"))?;
        Ok(row)
    }

    pub async fn update(&self, usage_id: Uuid, input: ApiUsageUpdate) -> Result<ApiUsage, DatabaseError> {
        let row = sqlx::query_as::<_, ApiUsage>(&format!(
            "UPDATE api_usage SET
                chat_usage = COALESCE($2, chat_usage),
                invoice_usage = COALESCE($3, invoice_usage),
                reset_date = COALESCE($4, reset_date),
                updated_at = NOW()
             WHERE usage_id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(usage_id)
        .bind(input.chat_usage)
        .bind(input.invoice_usage)
        .bind(input.reset_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Usage counters cannot be negative"))?;
        found(row, "Usage record not found")
    }

    pub async fn delete(&self, usage_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM api_usage WHERE usage_id = $1")
            .bind(usage_id)
            .execute(&self.pool)
            .await?;
        affected(result.rows_affected(), "Usage record not found")
    }

    pub async fn increment_chat_usage(&self, user_id: Uuid) -> Result<ApiUsage, DatabaseError> {
        self.increment(user_id, "chat_usage").await
    }

    pub async fn increment_invoice_usage(&self, user_id: Uuid) -> Result<ApiUsage, DatabaseError> {
        self.increment(user_id, "invoice_usage").await
    }

    // `column` is always one of the two counter names above
    async fn increment(&self, user_id: Uuid, column: &'static str) -> Result<ApiUsage, DatabaseError> {
        let row = sqlx::query_as::<_, ApiUsage>(&format!(
            "INSERT INTO api_usage (usage_id, user_id, {column}) VALUES ($1, $2, 1)
             ON CONFLICT (user_id) DO UPDATE SET {column} = api_usage.{column} + 1, updated_at = NOW()
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
