use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::dal::PlanDal;
use crate::database::models::plan::{Plan, PlanCreate, PlanUpdate};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// GET /api/v1/plans
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Plan>> {
    Ok(ApiResponse::success(PlanDal::new(state.db.clone()).list().await?))
}

/// POST /api/v1/plans - admin only
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<PlanCreate>,
) -> ApiResult<Plan> {
    current.require_admin()?;
    Ok(ApiResponse::created(PlanDal::new(state.db.clone()).create(input).await?))
}

/// GET /api/v1/plans/:plan_id
pub async fn get(State(state): State<AppState>, Path(plan_id): Path<Uuid>) -> ApiResult<Plan> {
    Ok(ApiResponse::success(PlanDal::new(state.db.clone()).get(plan_id).await?))
}

/// PUT /api/v1/plans/:plan_id - admin only
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(plan_id): Path<Uuid>,
    Json(input): Json<PlanUpdate>,
) -> ApiResult<Plan> {
    current.require_admin()?;
    Ok(ApiResponse::success(PlanDal::new(state.db.clone()).update(plan_id, input).await?))
}

/// DELETE /api/v1/plans/:plan_id - admin only
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(plan_id): Path<Uuid>,
) -> ApiResult<()> {
    current.require_admin()?;
    PlanDal::new(state.db.clone()).delete(plan_id).await?;
    Ok(ApiResponse::<()>::no_content())
}
