use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-user call counters for the chat and invoice features
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApiUsage {
    pub usage_id: Uuid,
    pub user_id: Uuid,
    pub chat_usage: i32,
    pub invoice_usage: i32,
    pub reset_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUsageCreate {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiUsageUpdate {
    pub chat_usage: Option<i32>,
    pub invoice_usage: Option<i32>,
    pub reset_date: Option<DateTime<Utc>>,
}
