// handlers/public/users.rs - account creation, sign-in and OTP flows

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{self, otp, password};
use crate::database::dal::user::NewUser;
use crate::database::dal::{RoleDal, UserDal};
use crate::database::models::role::RoleName;
use crate::database::models::user::{User, UserCreate, UserLogin, UserSummary};
use crate::error::ApiError;
use crate::middleware::auth::extract_bearer;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp_code: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub email: String,
    pub otp_code: String,
    pub new_password: String,
}

async fn user_by_email(state: &AppState, email: &str) -> Result<User, ApiError> {
    UserDal::new(state.db.clone())
        .find_by_email(email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Issue a fresh OTP for `user`. Delivery is out of band; the code is logged.
async fn issue_otp(state: &AppState, user: &User) -> Result<(), ApiError> {
    let code = otp::generate_otp();
    UserDal::new(state.db.clone())
        .save_otp(user.user_id, &code, otp::otp_expiry())
        .await?;
    tracing::info!("OTP for {}: {}", user.email, code);
    Ok(())
}

/// POST /api/v1/users/sign-up - register and receive an access token
///
/// New accounts get the `user` role and an unverified email with a
/// pending OTP.
pub async fn sign_up(State(state): State<AppState>, Json(input): Json<UserCreate>) -> ApiResult<Value> {
    if input.email.trim().is_empty() || !input.email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }
    if input.password.is_empty() {
        return Err(ApiError::bad_request("Password is required"));
    }

    let role = RoleDal::new(state.db.clone())
        .find_by_name(RoleName::User.as_str())
        .await?
        .ok_or_else(|| ApiError::bad_request("Role 'user' does not exist add role"))?;

    let users = UserDal::new(state.db.clone());
    if users.find_by_email(&input.email).await?.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let password_hash = password::hash_password(&input.password)?;
    let code = otp::generate_otp();
    let user = users
        .create(NewUser {
            email: input.email.trim(),
            first_name: &input.first_name,
            last_name: &input.last_name,
            phone_number: input.phone_number.as_deref(),
            password_hash: &password_hash,
            role_id: role.role_id,
            otp_code: &code,
            otp_expiry: otp::otp_expiry(),
        })
        .await?;
    tracing::info!("OTP for {}: {}", user.email, code);

    let token = auth::generate_access_token(&user)?;
    Ok(ApiResponse::created(json!({
        "message": "User created successfully. OTP sent to email.",
        "user": UserSummary::from(&user),
        "token": token,
    })))
}

/// POST /api/v1/users/sign-in - exchange email and password for tokens
///
/// A refresh token is only issued when `remember_me` is set.
pub async fn sign_in(State(state): State<AppState>, Json(input): Json<UserLogin>) -> ApiResult<Value> {
    let user = UserDal::new(state.db.clone())
        .find_by_email(&input.email)
        .await?
        .ok_or_else(|| ApiError::not_found("No user found"))?;

    let valid = user
        .password_hash
        .as_deref()
        .is_some_and(|hash| password::verify_password(&input.password, hash));
    if !valid {
        tracing::warn!("Failed sign-in for {}", user.email);
        return Err(ApiError::forbidden("Invalid email or password"));
    }

    let mut body = json!({
        "message": "Login successful",
        "token": auth::generate_access_token(&user)?,
        "user": UserSummary::from(&user),
    });
    if input.remember_me {
        body["refresh_token"] = json!(auth::generate_refresh_token(&user)?);
    }
    Ok(ApiResponse::success(body))
}

/// POST /api/v1/users/refresh-token - trade a bearer refresh token for a new access token
pub async fn refresh_token(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Value> {
    let token = extract_bearer(&headers)?;
    let claims = auth::decode_token(token).map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;
    if !claims.refresh {
        return Err(ApiError::forbidden("Please provide a refresh token"));
    }

    let user = UserDal::new(state.db.clone())
        .find(claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(json!({ "token": auth::generate_access_token(&user)? })))
}

/// POST /api/v1/users/send-otp
pub async fn send_otp(State(state): State<AppState>, Json(input): Json<EmailRequest>) -> ApiResult<Value> {
    let user = user_by_email(&state, &input.email).await?;
    issue_otp(&state, &user).await?;
    Ok(ApiResponse::success(json!({ "message": "OTP sent to email" })))
}

/// POST /api/v1/users/verify-otp
pub async fn verify_otp(State(state): State<AppState>, Json(input): Json<VerifyOtpRequest>) -> ApiResult<Value> {
    let user = user_by_email(&state, &input.email).await?;
    check_otp(&user, &input.otp_code)?;

    UserDal::new(state.db.clone()).mark_verified(user.user_id).await?;
    Ok(ApiResponse::success(json!({
        "message": "User verified successfully",
        "is_verified": true,
    })))
}

/// POST /api/v1/users/password-reset/request
pub async fn password_reset_request(
    State(state): State<AppState>,
    Json(input): Json<EmailRequest>,
) -> ApiResult<Value> {
    let user = user_by_email(&state, &input.email).await?;
    issue_otp(&state, &user).await?;
    Ok(ApiResponse::success(json!({ "message": "Password reset OTP sent to email" })))
}

/// POST /api/v1/users/password-reset/confirm
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Json(input): Json<PasswordResetConfirm>,
) -> ApiResult<Value> {
    if input.new_password.is_empty() {
        return Err(ApiError::bad_request("Password is required"));
    }
    let user = user_by_email(&state, &input.email).await?;
    check_otp(&user, &input.otp_code)?;

    let hash = password::hash_password(&input.new_password)?;
    UserDal::new(state.db.clone()).reset_password(user.user_id, &hash).await?;
    Ok(ApiResponse::success(json!({ "message": "Password reset successful" })))
}

fn check_otp(user: &User, code: &str) -> Result<(), ApiError> {
    user.check_otp(code.trim(), chrono::Utc::now())
        .map_err(|e| ApiError::bad_request(e.to_string()))
}
