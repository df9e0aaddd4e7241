use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum SqlToolsError {
    #[error("Error getting table schema: {0}")]
    Schema(String),

    #[error("Error running query: {0}")]
    Query(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
}

/// Read access to a target database: schema discovery and SELECT execution
#[async_trait]
pub trait SqlDatabase: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>, SqlToolsError>;

    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, SqlToolsError>;

    /// Run `sql`, returning at most `limit` rows as a JSON array of objects
    async fn run_query(&self, sql: &str, limit: i64) -> Result<Value, SqlToolsError>;
}

/// [`SqlDatabase`] over a Postgres pool
pub struct PgSqlTools {
    pool: PgPool,
}

impl PgSqlTools {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Strip whitespace, trailing `--` comments and semicolons so the
/// statement can be nested
pub fn strip_terminator(sql: &str) -> &str {
    let mut sql = sql.trim();
    loop {
        let stripped = sql.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
        let line_start = stripped.rfind('\n').map_or(0, |i| i + 1);
        match line_comment_start(&stripped[line_start..]) {
            Some(at) => sql = &stripped[..line_start + at],
            None => return stripped,
        }
    }
}

/// Byte offset of a `--` comment outside string literals
fn line_comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut in_string = false;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' => in_string = !in_string,
            b'-' if !in_string && bytes.get(i + 1) == Some(&b'-') => return Some(i),
            _ => {}
        }
    }
    None
}

fn wrap_query(sql: &str) -> String {
    // The newline keeps any comment left inside the statement off the closing paren
    format!(
        "SELECT COALESCE(json_agg(row_to_json(t)), '[]'::json) FROM (SELECT * FROM ({}\n) AS q LIMIT $1) AS t",
        strip_terminator(sql)
    )
}

#[async_trait]
impl SqlDatabase for PgSqlTools {
    async fn list_tables(&self) -> Result<Vec<String>, SqlToolsError> {
        tracing::debug!("Listing tables in the target database");
        sqlx::query_scalar::<_, String>(
            "SELECT table_name::text FROM information_schema.tables
             WHERE table_schema = current_schema() AND table_type = 'BASE TABLE'
             ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SqlToolsError::Schema(e.to_string()))
    }

    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, SqlToolsError> {
        tracing::debug!("Describing table: {}", table);
        sqlx::query_as::<_, ColumnInfo>(
            "SELECT column_name::text AS name, data_type::text AS data_type, (is_nullable = 'YES') AS nullable
             FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = $1
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SqlToolsError::Schema(e.to_string()))
    }

    async fn run_query(&self, sql: &str, limit: i64) -> Result<Value, SqlToolsError> {
        let query_err = |e: sqlx::Error| SqlToolsError::Query(e.to_string());
        tracing::debug!("Running sql |\n{}", sql);

        let mut tx = self.pool.begin().await.map_err(query_err)?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        let rows = sqlx::query_scalar::<_, Value>(&wrap_query(sql))
            .bind(limit.max(1))
            .fetch_one(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.rollback().await.map_err(query_err)?;
        Ok(rows)
    }
}
