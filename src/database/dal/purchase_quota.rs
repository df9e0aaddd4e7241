use sqlx::PgPool;
use uuid::Uuid;

use super::{affected, found};
use crate::database::models::purchase_quota::{PurchaseQuota, PurchaseQuotaCreate, PurchaseQuotaUpdate};
use crate::database::DatabaseError;

const COLUMNS: &str = "quota_id, api_name, purchase_amount_usd, notes, created_at";

pub struct PurchaseQuotaDal {
    pool: PgPool,
}

impl PurchaseQuotaDal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: PurchaseQuotaCreate) -> Result<PurchaseQuota, DatabaseError> {
        sqlx::query_as::<_, PurchaseQuota>(&format!(
            "INSERT INTO api_purchase_quota (quota_id, api_name, purchase_amount_usd, notes)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(input.api_name)
        .bind(input.purchase_amount_usd)
        .bind(input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Purchase amount cannot be negative"))
    }

    pub async fn list(&self) -> Result<Vec<PurchaseQuota>, DatabaseError> {
        let rows = sqlx::query_as::<_, PurchaseQuota>(&format!(
            "SELECT {COLUMNS} FROM api_purchase_quota ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, quota_id: Uuid) -> Result<PurchaseQuota, DatabaseError> {
        let row = sqlx::query_as::<_, PurchaseQuota>(&format!(
            "SELECT {COLUMNS} FROM api_purchase_quota WHERE quota_id = $1"
        ))
        .bind(quota_id)
        .fetch_optional(&self.pool)
        .await?;
        found(row, "Purchase quota not found")
    }

    pub async fn update(&self, quota_id: Uuid, input: PurchaseQuotaUpdate) -> Result<PurchaseQuota, DatabaseError> {
        let row = sqlx::query_as::<_, PurchaseQuota>(&format!(
            "UPDATE api_purchase_quota SET
                api_name = COALESCE($2, api_name),
                purchase_amount_usd = COALESCE($3, purchase_amount_usd),
                notes = COALESCE($4, notes)
             WHERE quota_id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(quota_id)
        .bind(input.api_name)
        .bind(input.purchase_amount_usd)
        .bind(input.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Purchase amount cannot be negative"))?;
        found(row, "Purchase quota not found")
    }

    pub async fn delete(&self, quota_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM api_purchase_quota WHERE quota_id = $1")
            .bind(quota_id)
            .execute(&self.pool)
            .await?;
        affected(result.rows_affected(), "Purchase quota not found")
    }
}
