use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Record of money spent on a third-party API
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchaseQuota {
    pub quota_id: Uuid,
    pub api_name: String,
    pub purchase_amount_usd: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseQuotaCreate {
    pub api_name: String,
    pub purchase_amount_usd: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseQuotaUpdate {
    pub api_name: Option<String>,
    pub purchase_amount_usd: Option<Decimal>,
    pub notes: Option<String>,
}
