use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::dal::{RoleDal, TokenBlocklistDal, UserDal};
use crate::database::models::user::{User, UserUpdate, UserWithRole};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// GET /api/v1/users/logout - revoke the presented access token
pub async fn logout(State(state): State<AppState>, Extension(current): Extension<CurrentUser>) -> ApiResult<Value> {
    let expires_at = Utc
        .timestamp_opt(current.claims.exp, 0)
        .single()
        .unwrap_or_else(Utc::now);
    TokenBlocklistDal::new(state.db.clone())
        .revoke(&current.claims.jti, expires_at)
        .await?;
    Ok(ApiResponse::success(json!({ "message": "Logout successful" })))
}

/// GET /api/v1/users/me
pub async fn me(State(state): State<AppState>, Extension(current): Extension<CurrentUser>) -> ApiResult<UserWithRole> {
    let role = match current.user.role_id {
        Some(role_id) => RoleDal::new(state.db.clone()).get(role_id).await.ok(),
        None => None,
    };
    Ok(ApiResponse::success(UserWithRole { user: current.user, role }))
}

/// GET /api/v1/users/all-users - admin only
pub async fn all_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Vec<User>> {
    current.require_admin()?;
    let users = UserDal::new(state.db.clone()).list().await?;
    if users.is_empty() {
        return Err(ApiError::not_found("No users found"));
    }
    Ok(ApiResponse::success(users))
}

/// GET /api/v1/users/by-email/:email
pub async fn by_email(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<User> {
    let user = UserDal::new(state.db.clone())
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(user))
}

/// GET /api/v1/users/:user_id
pub async fn get_user(State(state): State<AppState>, Path(user_id): Path<Uuid>) -> ApiResult<User> {
    Ok(ApiResponse::success(UserDal::new(state.db.clone()).get(user_id).await?))
}

/// PUT /api/v1/users/:user_id - partial update of profile fields
pub async fn update_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<UserUpdate>,
) -> ApiResult<User> {
    current.require_self_or_admin(user_id)?;
    if input.status_active.is_some() {
        current.require_admin()?;
    }
    Ok(ApiResponse::success(UserDal::new(state.db.clone()).update(user_id, input).await?))
}

/// DELETE /api/v1/users/:user_id
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<()> {
    current.require_self_or_admin(user_id)?;
    UserDal::new(state.db.clone()).delete(user_id).await?;
    tracing::info!("User {} deleted by {}", user_id, current.user_id());
    Ok(ApiResponse::<()>::no_content())
}

/// POST /api/v1/users/:user_id/change-role/:role_id - admin only
pub async fn change_role(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((user_id, role_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Value> {
    current.require_admin()?;

    RoleDal::new(state.db.clone())
        .get(role_id)
        .await
        .map_err(|_| ApiError::bad_request("Role not found"))?;

    let user = UserDal::new(state.db.clone()).change_role(user_id, role_id).await?;
    Ok(ApiResponse::success(json!({
        "message": "User role updated successfully",
        "user": user,
    })))
}
