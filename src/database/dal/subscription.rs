use sqlx::PgPool;
use uuid::Uuid;

use super::found;
use crate::database::models::plan::Plan;
use crate::database::models::subscription::{Subscription, SubscriptionUpdate};
use crate::database::DatabaseError;

const COLUMNS: &str = "subscription_id, user_id, plan_id, total_tokens_purchased, tokens_remaining, created_at, updated_at";

pub struct SubscriptionDal {
    pool: PgPool,
}

impl SubscriptionDal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start a subscription holding the plan's full token allowance
    pub async fn create(&self, user_id: Uuid, plan: &Plan) -> Result<Subscription, DatabaseError> {
        sqlx::query_as::<_, Subscription>(&format!(
            "INSERT INTO user_subscription (subscription_id, user_id, plan_id, total_tokens_purchased, tokens_remaining)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(plan.plan_id)
        .bind(plan.tokens)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Constraint(msg) if msg.contains("foreign key") => {
                DatabaseError::Constraint("User not found".into())
            }
            other => other.or_constraint("User already has a subscription"),
        })
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Subscription>, DatabaseError> {
        let sub = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {COLUMNS} FROM user_subscription WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sub)
    }

    pub async fn get_by_user(&self, user_id: Uuid) -> Result<Subscription, DatabaseError> {
        found(self.find_by_user(user_id).await?, "Subscription not found")
    }

    pub async fn update_by_user(&self, user_id: Uuid, input: SubscriptionUpdate) -> Result<Subscription, DatabaseError> {
        if input.has_negative_tokens() {
            return Err(DatabaseError::Constraint("Token balances cannot be negative".into()));
        }
        let sub = sqlx::query_as::<_, Subscription>(&format!(
            "UPDATE user_subscription SET
                plan_id = COALESCE($2, plan_id),
                total_tokens_purchased = COALESCE($3, total_tokens_purchased),
                tokens_remaining = COALESCE($4, tokens_remaining),
                updated_at = NOW()
             WHERE user_id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(user_id)
        .bind(input.plan_id)
        .bind(input.total_tokens_purchased)
        .bind(input.tokens_remaining)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Plan not found"))?;
        found(sub, "Subscription not found")
    }

    pub async fn has_minimum_tokens(&self, user_id: Uuid, minimum: i64) -> Result<bool, DatabaseError> {
        let remaining = sqlx::query_scalar::<_, i64>("SELECT tokens_remaining FROM user_subscription WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(remaining.is_some_and(|r| r >= minimum))
    }

    /// Subtract `tokens` from the balance, clamped at zero; returns the new balance
    pub async fn deduct_tokens(&self, user_id: Uuid, tokens: i64) -> Result<i64, DatabaseError> {
        let remaining = sqlx::query_scalar::<_, i64>(
            "UPDATE user_subscription
             SET tokens_remaining = GREATEST(tokens_remaining - $2, 0), updated_at = NOW()
             WHERE user_id = $1
             RETURNING tokens_remaining",
        )
        .bind(user_id)
        .bind(tokens.max(0))
        .fetch_optional(&self.pool)
        .await?;
        found(remaining, "Subscription not found")
    }
}
