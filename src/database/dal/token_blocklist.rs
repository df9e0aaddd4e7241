use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::DatabaseError;

/// Revoked token ids, consulted by the JWT middleware
pub struct TokenBlocklistDal {
    pool: PgPool,
}

impl TokenBlocklistDal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO token_blocklist (jti, expires_at) VALUES ($1, $2) ON CONFLICT (jti) DO NOTHING")
            .bind(jti)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        // Entries are only useful until the token would have expired anyway
        sqlx::query("DELETE FROM token_blocklist WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn is_revoked(&self, jti: &str) -> Result<bool, DatabaseError> {
        let revoked = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM token_blocklist WHERE jti = $1)")
            .bind(jti)
            .fetch_one(&self.pool)
            .await?;
        Ok(revoked)
    }
}
