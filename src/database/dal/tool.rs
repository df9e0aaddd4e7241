use sqlx::PgPool;
use uuid::Uuid;

use super::{affected, found};
use crate::database::models::tool::{Tool, ToolCreate, ToolUpdate};
use crate::database::DatabaseError;

const COLUMNS: &str = "tool_id, name, description, tool_config, sql_template, created_at";
const DUPLICATE_NAME: &str = "A tool with this name already exists";

pub struct ToolDal {
    pool: PgPool,
}

impl ToolDal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: ToolCreate) -> Result<Tool, DatabaseError> {
        sqlx::query_as::<_, Tool>(&format!(
            "INSERT INTO tools (tool_id, name, description, tool_config, sql_template)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(input.name)
        .bind(input.description)
        .bind(input.tool_config)
        .bind(input.sql_template)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint(DUPLICATE_NAME))
    }

    pub async fn list(&self) -> Result<Vec<Tool>, DatabaseError> {
        let tools = sqlx::query_as::<_, Tool>(&format!("SELECT {COLUMNS} FROM tools ORDER BY created_at, name"))
            .fetch_all(&self.pool)
            .await?;
        Ok(tools)
    }

    pub async fn get(&self, tool_id: Uuid) -> Result<Tool, DatabaseError> {
        let tool = sqlx::query_as::<_, Tool>(&format!("SELECT {COLUMNS} FROM tools WHERE tool_id = $1"))
            .bind(tool_id)
            .fetch_optional(&self.pool)
            .await?;
        found(tool, "Tool not found")
    }

    pub async fn update(&self, tool_id: Uuid, input: ToolUpdate) -> Result<Tool, DatabaseError> {
        let tool = sqlx::query_as::<_, Tool>(&format!(
            "UPDATE tools SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                tool_config = COALESCE($4, tool_config),
                sql_template = COALESCE($5, sql_template)
             WHERE tool_id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(tool_id)
        .bind(input.name)
        .bind(input.description)
        .bind(input.tool_config)
        .bind(input.sql_template)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint(DUPLICATE_NAME))?;
        found(tool, "Tool not found")
    }

    pub async fn delete(&self, tool_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM tools WHERE tool_id = $1")
            .bind(tool_id)
            .execute(&self.pool)
            .await?;
        affected(result.rows_affected(), "Tool not found")
    }
}
