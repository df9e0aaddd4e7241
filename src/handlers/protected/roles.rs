use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::dal::RoleDal;
use crate::database::models::role::{Role, RoleCreate, RoleUpdate};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// GET /api/v1/roles
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Role>> {
    Ok(ApiResponse::success(RoleDal::new(state.db.clone()).list().await?))
}

/// POST /api/v1/roles - admin only
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<RoleCreate>,
) -> ApiResult<Role> {
    current.require_admin()?;
    Ok(ApiResponse::created(RoleDal::new(state.db.clone()).create(input).await?))
}

/// GET /api/v1/roles/:role_id
pub async fn get(State(state): State<AppState>, Path(role_id): Path<Uuid>) -> ApiResult<Role> {
    Ok(ApiResponse::success(RoleDal::new(state.db.clone()).get(role_id).await?))
}

/// PUT /api/v1/roles/:role_id - admin only
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(role_id): Path<Uuid>,
    Json(input): Json<RoleUpdate>,
) -> ApiResult<Role> {
    current.require_admin()?;
    Ok(ApiResponse::success(RoleDal::new(state.db.clone()).update(role_id, input).await?))
}

/// DELETE /api/v1/roles/:role_id - admin only
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<()> {
    current.require_admin()?;
    RoleDal::new(state.db.clone()).delete(role_id).await?;
    Ok(ApiResponse::<()>::no_content())
}
