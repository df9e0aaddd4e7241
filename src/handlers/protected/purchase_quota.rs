// Spend on third-party APIs, tracked by operators. Every route is admin only.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::dal::PurchaseQuotaDal;
use crate::database::models::purchase_quota::{PurchaseQuota, PurchaseQuotaCreate, PurchaseQuotaUpdate};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Vec<PurchaseQuota>> {
    current.require_admin()?;
    Ok(ApiResponse::success(PurchaseQuotaDal::new(state.db.clone()).list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<PurchaseQuotaCreate>,
) -> ApiResult<PurchaseQuota> {
    current.require_admin()?;
    Ok(ApiResponse::created(PurchaseQuotaDal::new(state.db.clone()).create(input).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(quota_id): Path<Uuid>,
) -> ApiResult<PurchaseQuota> {
    current.require_admin()?;
    Ok(ApiResponse::success(PurchaseQuotaDal::new(state.db.clone()).get(quota_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(quota_id): Path<Uuid>,
    Json(input): Json<PurchaseQuotaUpdate>,
) -> ApiResult<PurchaseQuota> {
    current.require_admin()?;
    Ok(ApiResponse::success(PurchaseQuotaDal::new(state.db.clone()).update(quota_id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(quota_id): Path<Uuid>,
) -> ApiResult<()> {
    current.require_admin()?;
    PurchaseQuotaDal::new(state.db.clone()).delete(quota_id).await?;
    Ok(ApiResponse::<()>::no_content())
}
