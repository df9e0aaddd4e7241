use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub payment_id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub provider: String,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
    #[default]
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Stripe,
    Paypal,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Stripe => "stripe",
            PaymentProvider::Paypal => "paypal",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCreate {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub status: PaymentStatus,
    pub provider: PaymentProvider,
    pub transaction_id: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentUpdate {
    pub status: Option<PaymentStatus>,
    pub transaction_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults() {
        let body = serde_json::json!({
            "user_id": Uuid::new_v4(),
            "plan_id": Uuid::new_v4(),
            "amount": "19.99",
            "provider": "stripe",
            "transaction_id": "txn_1"
        });
        let create: PaymentCreate = serde_json::from_value(body).unwrap();
        assert_eq!(create.currency, "USD");
        assert_eq!(create.status, PaymentStatus::Pending);
        assert_eq!(create.provider.as_str(), "stripe");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let body = serde_json::json!({
            "user_id": Uuid::new_v4(),
            "plan_id": Uuid::new_v4(),
            "amount": 5,
            "provider": "venmo",
            "transaction_id": "txn_2"
        });
        assert!(serde_json::from_value::<PaymentCreate>(body).is_err());
    }
}
