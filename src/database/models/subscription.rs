use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's token balance, seeded from the tokens of a plan
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub total_tokens_purchased: i64,
    pub tokens_remaining: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionCreate {
    pub user_id: Uuid,
    pub plan_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionUpdate {
    pub plan_id: Option<Uuid>,
    pub total_tokens_purchased: Option<i64>,
    pub tokens_remaining: Option<i64>,
}

impl SubscriptionUpdate {
    pub fn has_negative_tokens(&self) -> bool {
        self.total_tokens_purchased.is_some_and(|v| v < 0) || self.tokens_remaining.is_some_and(|v| v < 0)
    }
}

impl Subscription {
    /// Balance after charging `tokens`, never below zero
    pub fn balance_after(&self, tokens: i64) -> i64 {
        (self.tokens_remaining - tokens.max(0)).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_is_clamped_at_zero() {
        let now = Utc::now();
        let sub = Subscription {
            subscription_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            total_tokens_purchased: 10_000,
            tokens_remaining: 6_000,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(sub.balance_after(1_500), 4_500);
        assert_eq!(sub.balance_after(9_000), 0);
        assert_eq!(sub.balance_after(-10), 6_000);
    }

    #[test]
    fn negative_updates_are_detected() {
        let update = SubscriptionUpdate { tokens_remaining: Some(-1), ..Default::default() };
        assert!(update.has_negative_tokens());
        assert!(!SubscriptionUpdate::default().has_negative_tokens());
    }
}
