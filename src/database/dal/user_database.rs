use sqlx::PgPool;
use uuid::Uuid;

use super::{affected, found};
use crate::database::models::user_database::{UserDatabase, UserDatabaseCreate, UserDatabaseUpdate};
use crate::database::DatabaseError;

const COLUMNS: &str = "db_id, user_id, db_type, host, port, username, password_encrypted, \
    database_name, connection_status, last_synced_at, created_at";

pub struct UserDatabaseDal {
    pool: PgPool,
}

impl UserDatabaseDal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, input: UserDatabaseCreate) -> Result<UserDatabase, DatabaseError> {
        sqlx::query_as::<_, UserDatabase>(&format!(
            "INSERT INTO user_databases
                (db_id, user_id, db_type, host, port, username, password_encrypted, database_name)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(input.db_type)
        .bind(input.host)
        .bind(input.port)
        .bind(input.username)
        .bind(input.password)
        .bind(input.database_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Invalid database connection details"))
    }

    pub async fn get(&self, db_id: Uuid) -> Result<UserDatabase, DatabaseError> {
        let db = sqlx::query_as::<_, UserDatabase>(&format!("SELECT {COLUMNS} FROM user_databases WHERE db_id = $1"))
            .bind(db_id)
            .fetch_optional(&self.pool)
            .await?;
        found(db, "Database connection not found")
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<UserDatabase>, DatabaseError> {
        let dbs = sqlx::query_as::<_, UserDatabase>(&format!(
            "SELECT {COLUMNS} FROM user_databases WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(dbs)
    }

    pub async fn update(&self, db_id: Uuid, input: UserDatabaseUpdate) -> Result<UserDatabase, DatabaseError> {
        let db = sqlx::query_as::<_, UserDatabase>(&format!(
            "UPDATE user_databases SET
                db_type = COALESCE($2, db_type),
                host = COALESCE($3, host),
                port = COALESCE($4, port),
                username = COALESCE($5, username),
                password_encrypted = COALESCE($6, password_encrypted),
                database_name = COALESCE($7, database_name),
                connection_status = COALESCE($8, connection_status)
             WHERE db_id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(db_id)
        .bind(input.db_type)
        .bind(input.host)
        .bind(input.port)
        .bind(input.username)
        .bind(input.password)
        .bind(input.database_name)
        .bind(input.connection_status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Invalid database connection details"))?;
        found(db, "Database connection not found")
    }

    pub async fn delete(&self, db_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM user_databases WHERE db_id = $1")
            .bind(db_id)
            .execute(&self.pool)
            .await?;
        affected(result.rows_affected(), "Database connection not found")
    }

    /// Record a successful connection
    pub async fn mark_synced(&self, db_id: Uuid) -> Result<UserDatabase, DatabaseError> {
        let db = sqlx::query_as::<_, UserDatabase>(&format!(
            "UPDATE user_databases SET connection_status = 'connected', last_synced_at = NOW()
             WHERE db_id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(db_id)
        .fetch_optional(&self.pool)
        .await?;
        found(db, "Database connection not found")
    }
}
