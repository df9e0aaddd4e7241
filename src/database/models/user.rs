use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::Role;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(skip_serializing)]
    pub otp_code: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expiry: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role_id: Option<Uuid>,
    pub status_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact user representation returned by the auth endpoints
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
        }
    }
}

/// User with its role resolved, as returned by `/users/me`
#[derive(Debug, Clone, Serialize)]
pub struct UserWithRole {
    #[serde(flatten)]
    pub user: User,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub status_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserLogin {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

impl User {
    /// Whether `code` matches the stored OTP and has not expired at `now`
    pub fn check_otp(&self, code: &str, now: DateTime<Utc>) -> Result<(), OtpError> {
        match (&self.otp_code, self.otp_expiry) {
            (Some(stored), _) if stored != code => Err(OtpError::Invalid),
            (Some(_), Some(expiry)) if expiry < now => Err(OtpError::Expired),
            (Some(_), Some(_)) => Ok(()),
            _ => Err(OtpError::Invalid),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("Invalid OTP code")]
    Invalid,
    #[error("OTP expired")]
    Expired,
}
