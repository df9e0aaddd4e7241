use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApiKey {
    pub users_api_key_id: Uuid,
    pub user_id: Uuid,
    pub api_key: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeyCreate {
    /// Defaults to the calling user
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expiry() {
        let now = Utc::now();
        let mut key = ApiKey {
            users_api_key_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            api_key: "k".into(),
            name: None,
            created_at: now,
            expires_at: None,
        };
        assert!(!key.is_expired(now));
        key.expires_at = Some(now - Duration::seconds(1));
        assert!(key.is_expired(now));
        key.expires_at = Some(now + Duration::days(30));
        assert!(!key.is_expired(now));
    }
}
