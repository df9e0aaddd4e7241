use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{affected, found};
use crate::database::models::user::{User, UserUpdate};
use crate::database::DatabaseError;

const COLUMNS: &str = "user_id, email, phone_number, otp_code, otp_expiry, password_hash, \
    first_name, last_name, role_id, status_active, is_verified, created_at, updated_at";

/// Fields for a new user row; the password is already hashed
pub struct NewUser<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone_number: Option<&'a str>,
    pub password_hash: &'a str,
    pub role_id: Uuid,
    pub otp_code: &'a str,
    pub otp_expiry: DateTime<Utc>,
}

pub struct UserDal {
    pool: PgPool,
}

impl UserDal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: NewUser<'_>) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users
                (user_id, email, phone_number, password_hash, first_name, last_name, role_id, otp_code, otp_expiry)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(input.email)
        .bind(input.phone_number)
        .bind(input.password_hash)
        .bind(input.first_name)
        .bind(input.last_name)
        .bind(input.role_id)
        .bind(input.otp_code)
        .bind(input.otp_expiry)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Email or phone number already registered"))
    }

    pub async fn get(&self, user_id: Uuid) -> Result<User, DatabaseError> {
        found(self.find(user_id).await?, "User not found")
    }

    pub async fn find(&self, user_id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE user_id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users ORDER BY created_at"))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn update(&self, user_id: Uuid, input: UserUpdate) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone_number = COALESCE($4, phone_number),
                status_active = COALESCE($5, status_active),
                updated_at = NOW()
             WHERE user_id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(user_id)
        .bind(input.first_name)
        .bind(input.last_name)
        .bind(input.phone_number)
        .bind(input.status_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Phone number already registered"))?;
        found(user, "User not found")
    }

    pub async fn delete(&self, user_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        affected(result.rows_affected(), "User not found")
    }

    pub async fn change_role(&self, user_id: Uuid, role_id: Uuid) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role_id = $2, updated_at = NOW() WHERE user_id = $1 RETURNING {COLUMNS}"
        ))
        .bind(user_id)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Role not found"))?;
        found(user, "User not found")
    }

    pub async fn save_otp(&self, user_id: Uuid, code: &str, expiry: DateTime<Utc>) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE users SET otp_code = $2, otp_expiry = $3, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .bind(code)
            .bind(expiry)
            .execute(&self.pool)
            .await?;
        affected(result.rows_affected(), "User not found")
    }

    /// Clear the OTP and flag the account verified
    pub async fn mark_verified(&self, user_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET is_verified = TRUE, otp_code = NULL, otp_expiry = NULL, updated_at = NOW()
             WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        affected(result.rows_affected(), "User not found")
    }

    /// Store a new password hash and consume the OTP
    pub async fn reset_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, otp_code = NULL, otp_expiry = NULL, updated_at = NOW()
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        affected(result.rows_affected(), "User not found")
    }
}
