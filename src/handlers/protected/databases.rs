use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::dal::UserDatabaseDal;
use crate::database::models::user_database::{UserDatabase, UserDatabaseCreate, UserDatabaseUpdate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// Load a connection the caller owns; others' connections look missing
pub async fn owned_database(state: &AppState, current_user: Uuid, db_id: Uuid) -> Result<UserDatabase, ApiError> {
    let db = UserDatabaseDal::new(state.db.clone()).get(db_id).await?;
    if db.user_id != current_user {
        return Err(ApiError::not_found("Database connection not found"));
    }
    Ok(db)
}

/// GET /api/v1/databases - the caller's saved connections
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Vec<UserDatabase>> {
    let dbs = UserDatabaseDal::new(state.db.clone()).list_by_user(current.user_id()).await?;
    Ok(ApiResponse::success(dbs))
}

/// POST /api/v1/databases
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<UserDatabaseCreate>,
) -> ApiResult<UserDatabase> {
    if !(1..=65535).contains(&input.port) {
        return Err(ApiError::bad_request("Port must be between 1 and 65535"));
    }
    let db = UserDatabaseDal::new(state.db.clone()).create(current.user_id(), input).await?;
    Ok(ApiResponse::created(db))
}

/// GET /api/v1/databases/:db_id
pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(db_id): Path<Uuid>,
) -> ApiResult<UserDatabase> {
    Ok(ApiResponse::success(owned_database(&state, current.user_id(), db_id).await?))
}

/// PUT /api/v1/databases/:db_id
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(db_id): Path<Uuid>,
    Json(input): Json<UserDatabaseUpdate>,
) -> ApiResult<UserDatabase> {
    owned_database(&state, current.user_id(), db_id).await?;
    Ok(ApiResponse::success(UserDatabaseDal::new(state.db.clone()).update(db_id, input).await?))
}

/// DELETE /api/v1/databases/:db_id
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(db_id): Path<Uuid>,
) -> ApiResult<()> {
    owned_database(&state, current.user_id(), db_id).await?;
    UserDatabaseDal::new(state.db.clone()).delete(db_id).await?;
    Ok(ApiResponse::<()>::no_content())
}
