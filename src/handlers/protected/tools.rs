use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::dal::ToolDal;
use crate::database::models::tool::{Tool, ToolCreate, ToolUpdate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// GET /api/v1/tools
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Tool>> {
    Ok(ApiResponse::success(ToolDal::new(state.db.clone()).list().await?))
}

/// POST /api/v1/tools - admin only; names are unique
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<ToolCreate>,
) -> ApiResult<Tool> {
    current.require_admin()?;
    if input.name.trim().is_empty() {
        return Err(ApiError::bad_request("Tool name is required"));
    }
    Ok(ApiResponse::created(ToolDal::new(state.db.clone()).create(input).await?))
}

pub async fn get(State(state): State<AppState>, Path(tool_id): Path<Uuid>) -> ApiResult<Tool> {
    Ok(ApiResponse::success(ToolDal::new(state.db.clone()).get(tool_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(tool_id): Path<Uuid>,
    Json(input): Json<ToolUpdate>,
) -> ApiResult<Tool> {
    current.require_admin()?;
    Ok(ApiResponse::success(ToolDal::new(state.db.clone()).update(tool_id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(tool_id): Path<Uuid>,
) -> ApiResult<()> {
    current.require_admin()?;
    ToolDal::new(state.db.clone()).delete(tool_id).await?;
    Ok(ApiResponse::<()>::no_content())
}
