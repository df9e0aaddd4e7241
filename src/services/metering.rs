use sqlx::PgPool;
use uuid::Uuid;

use crate::database::dal::{ApiUsageDal, SubscriptionDal};
use crate::database::DatabaseError;
use crate::services::llm::TokenUsage;

/// Charge a completed query: deduct its tokens from the subscription
/// (never below zero) and count one chat call. Returns the new balance.
pub async fn charge(pool: &PgPool, user_id: Uuid, usage: &TokenUsage) -> Result<i64, DatabaseError> {
    let tokens = i64::try_from(usage.total_tokens).unwrap_or(i64::MAX);
    let remaining = SubscriptionDal::new(pool.clone()).deduct_tokens(user_id, tokens).await?;
    ApiUsageDal::new(pool.clone()).increment_chat_usage(user_id).await?;

    tracing::info!(
        "Deducted {} tokens from user {}, {} remaining",
        tokens,
        user_id,
        remaining
    );
    Ok(remaining)
}
