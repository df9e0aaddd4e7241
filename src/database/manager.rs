use sqlx::{postgres::PgPoolOptions, PgPool};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config;

/// Errors from DatabaseManager and the data-access layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Unsupported database type: {0}")]
    UnsupportedDatabase(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Constraint(String),

    #[error("Could not connect to target database: {0}")]
    TargetUnreachable(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // unique_violation, foreign_key_violation, check_violation
            if let Some("23505" | "23503" | "23514") = db_err.code().as_deref() {
                return DatabaseError::Constraint(db_err.message().to_string());
            }
        }
        DatabaseError::Sqlx(err)
    }
}

impl DatabaseError {
    /// Replace the message of a constraint violation, leaving other errors untouched
    pub fn or_constraint(self, message: &str) -> Self {
        match self {
            DatabaseError::Constraint(_) => DatabaseError::Constraint(message.to_string()),
            other => other,
        }
    }
}

/// Connection pool manager for the service database and the target
/// databases that the query agent reads from.
///
/// Target pools are owned by the instance held in `AppState`, so every
/// running app (and its runtime) keeps its own connections.
pub struct DatabaseManager {
    targets: RwLock<TargetPools>,
    limit: usize,
}

#[derive(Default)]
struct TargetPools {
    pools: HashMap<String, PgPool>,
    /// Connection URLs, oldest first
    order: VecDeque<String>,
}

impl Default for DatabaseManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseManager {
    pub fn new() -> Self {
        Self::with_limit(config::config().database.target_pool_limit)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            targets: RwLock::new(TargetPools::default()),
            limit: limit.max(1),
        }
    }

    /// Connect the service database pool from DATABASE_URL
    pub async fn connect_main() -> Result<PgPool, DatabaseError> {
        let url = std::env::var("DATABASE_URL").map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let settings = &config::config().database;

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.connection_timeout))
            .connect(&url)
            .await?;

        info!("Connected service database pool");
        Ok(pool)
    }

    /// Apply pending schema migrations
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Pings the given pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Get a pool for a user-supplied target database, creating it lazily
    pub async fn target_pool(&self, connection_url: &str) -> Result<PgPool, DatabaseError> {
        let normalized = Self::normalize_target_url(connection_url)?;
        self.get_pool(&normalized).await
    }

    /// Get existing pool or create a new one lazily
    async fn get_pool(&self, connection_url: &str) -> Result<PgPool, DatabaseError> {
        // Fast path: try read lock
        {
            let targets = self.targets.read().await;
            if let Some(pool) = targets.pools.get(connection_url) {
                return Ok(pool.clone());
            }
        }

        let settings = &config::config().database;
        let pool = PgPoolOptions::new()
            .max_connections(settings.target_max_connections)
            .acquire_timeout(Duration::from_secs(settings.target_connection_timeout))
            .connect(connection_url)
            .await
            .map_err(|e| {
                warn!("Target database unreachable: {}: {}", Self::redact(connection_url), e);
                DatabaseError::TargetUnreachable(e.to_string())
            })?;

        let pool = self.cache(connection_url, pool).await;
        info!("Created target database pool for: {}", Self::redact(connection_url));
        Ok(pool)
    }

    /// Store a pool, evicting the oldest entries past the limit
    async fn cache(&self, connection_url: &str, pool: PgPool) -> PgPool {
        let mut stale = Vec::new();
        let cached = {
            let mut targets = self.targets.write().await;
            if let Some(existing) = targets.pools.get(connection_url).cloned() {
                // A concurrent request won the race
                stale.push(pool);
                existing
            } else {
                while targets.pools.len() >= self.limit {
                    let Some(oldest) = targets.order.pop_front() else { break };
                    if let Some(evicted) = targets.pools.remove(&oldest) {
                        info!("Evicting target database pool: {}", Self::redact(&oldest));
                        stale.push(evicted);
                    }
                }
                targets.pools.insert(connection_url.to_string(), pool.clone());
                targets.order.push_back(connection_url.to_string());
                pool
            }
        };

        for pool in stale {
            pool.close().await;
        }
        cached
    }

    /// Number of target pools currently open
    pub async fn target_count(&self) -> usize {
        self.targets.read().await.pools.len()
    }

    /// Accept postgres URLs, including SQLAlchemy-style driver suffixes
    /// such as `postgresql+psycopg2://`
    fn normalize_target_url(connection_url: &str) -> Result<String, DatabaseError> {
        let mut url = url::Url::parse(connection_url.trim()).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        let scheme = url.scheme().split('+').next().unwrap_or_default().to_string();

        match scheme.as_str() {
            "postgres" | "postgresql" => {}
            other => return Err(DatabaseError::UnsupportedDatabase(other.to_string())),
        }
        if url.host_str().is_none() {
            return Err(DatabaseError::InvalidDatabaseUrl);
        }

        let rest = &url.as_str()[url.scheme().len()..];
        let rebuilt = format!("postgres{}", rest);
        url = url::Url::parse(&rebuilt).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        Ok(url.into())
    }

    /// Strip credentials before a URL reaches the logs
    pub fn redact(connection_url: &str) -> String {
        match url::Url::parse(connection_url) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("****"));
                }
                url.into()
            }
            Err(_) => "<invalid url>".to_string(),
        }
    }

    /// Close and remove all target pools (e.g., on shutdown)
    pub async fn close_all(&self) {
        let drained: Vec<(String, PgPool)> = {
            let mut targets = self.targets.write().await;
            targets.order.clear();
            targets.pools.drain().collect()
        };
        for (name, pool) in drained {
            pool.close().await;
            info!("Closed database pool: {}", Self::redact(&name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_postgres_urls() {
        let url = DatabaseManager::normalize_target_url("postgresql://u:p@localhost:5432/sales").unwrap();
        assert!(url.starts_with("postgres://u:p@localhost:5432/sales"));

        let url = DatabaseManager::normalize_target_url("postgresql+psycopg2://u:p@db/sales").unwrap();
        assert!(url.starts_with("postgres://u:p@db/sales"));
    }

    #[test]
    fn rejects_other_engines() {
        let err = DatabaseManager::normalize_target_url("mysql+pymysql://u:p@localhost:3306/SALES").unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedDatabase(ref s) if s == "mysql"));

        let err = DatabaseManager::normalize_target_url("not a url").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidDatabaseUrl));
    }

    #[test]
    fn redacts_passwords() {
        let redacted = DatabaseManager::redact("postgres://sales_user:1234@db:5432/sales");
        assert!(!redacted.contains("1234"));
        assert!(redacted.contains("sales_user"));
    }

    #[test]
    fn constraint_message_override() {
        let err = DatabaseError::Constraint("duplicate key".into()).or_constraint("Tool already exists");
        assert_eq!(err.to_string(), "Tool already exists");

        let err = DatabaseError::NotFound("x".into()).or_constraint("ignored");
        assert_eq!(err.to_string(), "x");
    }

    fn lazy_pool(url: &str) -> PgPool {
        PgPoolOptions::new().connect_lazy(url).unwrap()
    }

    #[tokio::test]
    async fn target_pools_are_bounded() {
        let manager = DatabaseManager::with_limit(2);
        for db in ["a", "b", "c"] {
            let url = format!("postgres://u@localhost/{db}");
            manager.cache(&url, lazy_pool(&url)).await;
        }
        assert_eq!(manager.target_count().await, 2);

        let targets = manager.targets.read().await;
        assert!(!targets.pools.contains_key("postgres://u@localhost/a"));
        assert!(targets.pools.contains_key("postgres://u@localhost/c"));
    }

    #[tokio::test]
    async fn repeated_urls_share_one_pool() {
        let manager = DatabaseManager::with_limit(4);
        let url = "postgres://u@localhost/sales";
        manager.cache(url, lazy_pool(url)).await;
        manager.cache(url, lazy_pool(url)).await;
        assert_eq!(manager.target_count().await, 1);

        manager.close_all().await;
        assert_eq!(manager.target_count().await, 0);
    }

    #[tokio::test]
    async fn unreachable_target_is_reported_as_such() {
        let manager = DatabaseManager::with_limit(1);
        let err = manager.target_pool("postgres://u:p@127.0.0.1:1/sales").await.unwrap_err();
        assert!(matches!(err, DatabaseError::TargetUnreachable(_)));
        assert!(err.to_string().starts_with("Could not connect to target database"));
        assert_eq!(manager.target_count().await, 0);
    }
}
