use sqlx::PgPool;
use uuid::Uuid;

use super::{affected, found};
use crate::database::models::payment::{Payment, PaymentCreate, PaymentUpdate};
use crate::database::models::Pagination;
use crate::database::DatabaseError;

const COLUMNS: &str = "payment_id, user_id, plan_id, amount, currency, status, provider, transaction_id, created_at";
const DUPLICATE_TRANSACTION: &str = "Payment with this transaction_id already exists";

pub struct PaymentDal {
    pool: PgPool,
}

impl PaymentDal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: PaymentCreate) -> Result<Payment, DatabaseError> {
        sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments (payment_id, user_id, plan_id, amount, currency, status, provider, transaction_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(input.user_id)
        .bind(input.plan_id)
        .bind(input.amount)
        .bind(input.currency.to_uppercase())
        .bind(input.status.as_str())
        .bind(input.provider.as_str())
        .bind(input.transaction_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Constraint(msg) if msg.contains("transaction_id") => {
                DatabaseError::Constraint(DUPLICATE_TRANSACTION.into())
            }
            other => other.or_constraint("User or plan not found"),
        })
    }

    pub async fn list(&self, page: Pagination) -> Result<Vec<Payment>, DatabaseError> {
        let (skip, limit) = page.bounds();
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {COLUMNS} FROM payments ORDER BY created_at DESC OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>, DatabaseError> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {COLUMNS} FROM payments WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    pub async fn get(&self, payment_id: Uuid) -> Result<Payment, DatabaseError> {
        let payment = sqlx::query_as::<_, Payment>(&format!("SELECT {COLUMNS} FROM payments WHERE payment_id = $1"))
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?;
        found(payment, "Payment not found")
    }

    pub async fn update(&self, payment_id: Uuid, input: PaymentUpdate) -> Result<Payment, DatabaseError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments SET
                status = COALESCE($2, status),
                transaction_id = COALESCE($3, transaction_id)
             WHERE payment_id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(payment_id)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint(DUPLICATE_TRANSACTION))?;
        found(payment, "Payment not found")
    }

    pub async fn delete(&self, payment_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM payments WHERE payment_id = $1")
            .bind(payment_id)
            .execute(&self.pool)
            .await?;
        affected(result.rows_affected(), "Payment not found")
    }

    pub async fn user_has_successful_payment(&self, user_id: Uuid) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM payments WHERE user_id = $1 AND status = 'succeeded')",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
