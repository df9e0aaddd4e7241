use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::dal::{PlanDal, SubscriptionDal};
use crate::database::models::subscription::{Subscription, SubscriptionCreate, SubscriptionUpdate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// POST /api/v1/subscriptions - subscribe a user to a plan
///
/// The new balance equals the plan's token allowance. A user holds at most
/// one subscription. Callers subscribe themselves; admins may subscribe anyone.
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<SubscriptionCreate>,
) -> ApiResult<Subscription> {
    current.require_self_or_admin(input.user_id)?;

    let plan = PlanDal::new(state.db.clone())
        .find(input.plan_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Plan not found"))?;

    let sub = SubscriptionDal::new(state.db.clone()).create(input.user_id, &plan).await?;
    tracing::info!("User {} subscribed to plan {} ({} tokens)", sub.user_id, plan.title, plan.tokens);
    Ok(ApiResponse::created(sub))
}

/// GET /api/v1/subscriptions/user/:user_id
pub async fn get_by_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Subscription> {
    current.require_self_or_admin(user_id)?;
    Ok(ApiResponse::success(SubscriptionDal::new(state.db.clone()).get_by_user(user_id).await?))
}

/// PUT /api/v1/subscriptions/user/:user_id - admin only, the balance is metered
pub async fn update_by_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<SubscriptionUpdate>,
) -> ApiResult<Subscription> {
    current.require_admin()?;

    if let Some(plan_id) = input.plan_id {
        PlanDal::new(state.db.clone())
            .find(plan_id)
            .await?
            .ok_or_else(|| ApiError::bad_request("Plan not found"))?;
    }
    let sub = SubscriptionDal::new(state.db.clone()).update_by_user(user_id, input).await?;
    tracing::info!("Admin {} updated subscription of user {}", current.user_id(), user_id);
    Ok(ApiResponse::success(sub))
}
