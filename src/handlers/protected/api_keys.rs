use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::api_key::generate_api_key;
use crate::database::dal::ApiKeyDal;
use crate::database::models::api_key::{ApiKey, ApiKeyCreate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

fn require_owner(current: &CurrentUser, owner: Uuid) -> Result<(), ApiError> {
    if current.user_id() == owner || current.is_admin() {
        Ok(())
    } else {
        Err(ApiError::not_found("API key not found"))
    }
}

/// POST /api/v1/api-keys - mint a key, for the caller unless a user id is given
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<ApiKeyCreate>,
) -> ApiResult<ApiKey> {
    let user_id = input.user_id.unwrap_or_else(|| current.user_id());
    current.require_self_or_admin(user_id)?;

    let key = ApiKeyDal::new(state.db.clone())
        .create(user_id, &generate_api_key(), input.name.as_deref(), input.expires_at)
        .await?;
    tracing::info!("API key {} issued to user {}", key.users_api_key_id, user_id);
    Ok(ApiResponse::created(key))
}

/// GET /api/v1/api-keys/user/:user_id
pub async fn list_by_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Vec<ApiKey>> {
    if user_id != current.user_id() {
        current.require_admin()?;
    }
    Ok(ApiResponse::success(ApiKeyDal::new(state.db.clone()).list_by_user(user_id).await?))
}

/// GET /api/v1/api-keys/:api_key
pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(api_key): Path<String>,
) -> ApiResult<ApiKey> {
    let key = ApiKeyDal::new(state.db.clone()).get(&api_key).await?;
    require_owner(&current, key.user_id)?;
    Ok(ApiResponse::success(key))
}

/// DELETE /api/v1/api-keys/:api_key - revoke, returning the removed key
pub async fn revoke(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(api_key): Path<String>,
) -> ApiResult<ApiKey> {
    let dal = ApiKeyDal::new(state.db.clone());
    require_owner(&current, dal.get(&api_key).await?.user_id)?;

    let revoked = dal.revoke(&api_key).await?;
    tracing::info!("API key {} revoked", revoked.users_api_key_id);
    Ok(ApiResponse::success(revoked))
}
