use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Named, parameterized SQL snippet the query agent may pick instead of
/// generating SQL from scratch
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tool {
    pub tool_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub tool_config: Option<Value>,
    pub sql_template: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCreate {
    pub name: String,
    pub description: Option<String>,
    pub tool_config: Option<Value>,
    pub sql_template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tool_config: Option<Value>,
    pub sql_template: Option<String>,
}
