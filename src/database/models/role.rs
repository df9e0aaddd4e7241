use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub role_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role names understood by the authorization checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    User,
    Admin,
    SuperAdmin,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::User => "user",
            RoleName::Admin => "admin",
            RoleName::SuperAdmin => "super_admin",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleCreate {
    pub name: RoleName,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<RoleName>,
    pub description: Option<String>,
    pub status_active: Option<bool>,
}
