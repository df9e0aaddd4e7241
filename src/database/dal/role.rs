use sqlx::PgPool;
use uuid::Uuid;

use super::{affected, found};
use crate::database::models::role::{Role, RoleCreate, RoleUpdate};
use crate::database::DatabaseError;

const COLUMNS: &str = "role_id, name, description, status_active, created_at, updated_at";

pub struct RoleDal {
    pool: PgPool,
}

impl RoleDal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Role>, DatabaseError> {
        let roles = sqlx::query_as::<_, Role>(&format!("SELECT {COLUMNS} FROM roles ORDER BY created_at, name"))
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    pub async fn get(&self, role_id: Uuid) -> Result<Role, DatabaseError> {
        let role = sqlx::query_as::<_, Role>(&format!("SELECT {COLUMNS} FROM roles WHERE role_id = $1"))
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?;
        found(role, "Role not found")
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Role>, DatabaseError> {
        let role = sqlx::query_as::<_, Role>(&format!("SELECT {COLUMNS} FROM roles WHERE name = $1"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    pub async fn create(&self, input: RoleCreate) -> Result<Role, DatabaseError> {
        sqlx::query_as::<_, Role>(&format!(
            "INSERT INTO roles (role_id, name, description) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(input.name.as_str())
        .bind(input.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Role already exists"))
    }

    pub async fn update(&self, role_id: Uuid, input: RoleUpdate) -> Result<Role, DatabaseError> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "UPDATE roles SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                status_active = COALESCE($4, status_active),
                updated_at = NOW()
             WHERE role_id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(role_id)
        .bind(input.name.map(|n| n.as_str()))
        .bind(input.description)
        .bind(input.status_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Role already exists"))?;
        found(role, "Role not found")
    }

    pub async fn delete(&self, role_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM roles WHERE role_id = $1")
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(e).or_constraint("Role is still assigned to users"))?;
        affected(result.rows_affected(), "Role not found")
    }
}
