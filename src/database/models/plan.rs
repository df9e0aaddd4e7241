use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub plan_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub monthly_price: f64,
    pub yearly_price: f64,
    /// Billing provider price identifier
    pub price_id: String,
    pub features: Value,
    pub tokens: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanCreate {
    pub title: String,
    pub description: Option<String>,
    pub monthly_price: f64,
    pub yearly_price: f64,
    pub price_id: String,
    #[serde(default = "empty_features")]
    pub features: Value,
    pub tokens: i64,
}

fn empty_features() -> Value {
    Value::Array(Vec::new())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub monthly_price: Option<f64>,
    pub yearly_price: Option<f64>,
    pub price_id: Option<String>,
    pub features: Option<Value>,
    pub tokens: Option<i64>,
}
