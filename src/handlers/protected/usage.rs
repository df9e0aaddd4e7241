use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::dal::ApiUsageDal;
use crate::database::models::api_usage::{ApiUsage, ApiUsageCreate, ApiUsageUpdate};
use crate::database::models::Pagination;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// GET /api/v1/usage?skip=&limit= (admin)
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<Pagination>,
) -> ApiResult<Vec<ApiUsage>> {
    current.require_admin()?;
    Ok(ApiResponse::success(ApiUsageDal::new(state.db.clone()).list(page).await?))
}

/// POST /api/v1/usage - counters start at zero
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<ApiUsageCreate>,
) -> ApiResult<ApiUsage> {
    current.require_self_or_admin(input.user_id)?;
    Ok(ApiResponse::created(ApiUsageDal::new(state.db.clone()).create(input.user_id).await?))
}

/// GET /api/v1/usage/my/usage - the caller's counters, created on first use
pub async fn my_usage(State(state): State<AppState>, Extension(current): Extension<CurrentUser>) -> ApiResult<ApiUsage> {
    Ok(ApiResponse::success(
        ApiUsageDal::new(state.db.clone()).get_or_create(current.user_id()).await?,
    ))
}

/// GET /api/v1/usage/user/:user_id
pub async fn get_by_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<ApiUsage> {
    current.require_self_or_admin(user_id)?;
    Ok(ApiResponse::success(ApiUsageDal::new(state.db.clone()).get_by_user(user_id).await?))
}

/// GET /api/v1/usage/:usage_id
pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(usage_id): Path<Uuid>,
) -> ApiResult<ApiUsage> {
    let usage = ApiUsageDal::new(state.db.clone()).get(usage_id).await?;
    current.require_self_or_admin(usage.user_id)?;
    Ok(ApiResponse::success(usage))
}

/// PUT /api/v1/usage/:usage_id (admin)
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(usage_id): Path<Uuid>,
    Json(input): Json<ApiUsageUpdate>,
) -> ApiResult<ApiUsage> {
    current.require_admin()?;
    Ok(ApiResponse::success(ApiUsageDal::new(state.db.clone()).update(usage_id, input).await?))
}

/// DELETE /api/v1/usage/:usage_id (admin)
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(usage_id): Path<Uuid>,
) -> ApiResult<()> {
    current.require_admin()?;
    ApiUsageDal::new(state.db.clone()).delete(usage_id).await?;
    Ok(ApiResponse::<()>::no_content())
}
