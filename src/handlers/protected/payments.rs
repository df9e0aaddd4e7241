use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::dal::PaymentDal;
use crate::database::models::payment::{Payment, PaymentCreate, PaymentUpdate};
use crate::database::models::Pagination;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// GET /api/v1/payments?skip=&limit= (admin)
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<Pagination>,
) -> ApiResult<Vec<Payment>> {
    current.require_admin()?;
    Ok(ApiResponse::success(PaymentDal::new(state.db.clone()).list(page).await?))
}

/// POST /api/v1/payments - record a payment; no balance is credited
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<PaymentCreate>,
) -> ApiResult<Payment> {
    current.require_self_or_admin(input.user_id)?;
    if input.amount.is_sign_negative() {
        return Err(ApiError::bad_request("Payment amount cannot be negative"));
    }
    if input.currency.len() != 3 {
        return Err(ApiError::bad_request("Currency must be a 3-letter code"));
    }
    Ok(ApiResponse::created(PaymentDal::new(state.db.clone()).create(input).await?))
}

/// GET /api/v1/payments/user/:user_id
pub async fn list_by_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Vec<Payment>> {
    current.require_self_or_admin(user_id)?;
    Ok(ApiResponse::success(PaymentDal::new(state.db.clone()).list_by_user(user_id).await?))
}

/// GET /api/v1/payments/user/:user_id/status - whether any payment has succeeded
pub async fn payment_status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Value> {
    current.require_self_or_admin(user_id)?;
    let paid = PaymentDal::new(state.db.clone()).user_has_successful_payment(user_id).await?;
    Ok(ApiResponse::success(json!({ "user_id": user_id, "has_successful_payment": paid })))
}

/// GET /api/v1/payments/:payment_id
pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(payment_id): Path<Uuid>,
) -> ApiResult<Payment> {
    let payment = PaymentDal::new(state.db.clone()).get(payment_id).await?;
    current.require_self_or_admin(payment.user_id)?;
    Ok(ApiResponse::success(payment))
}

/// PUT /api/v1/payments/:payment_id (admin)
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(payment_id): Path<Uuid>,
    Json(input): Json<PaymentUpdate>,
) -> ApiResult<Payment> {
    current.require_admin()?;
    Ok(ApiResponse::success(PaymentDal::new(state.db.clone()).update(payment_id, input).await?))
}

/// DELETE /api/v1/payments/:payment_id (admin)
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(payment_id): Path<Uuid>,
) -> ApiResult<()> {
    current.require_admin()?;
    PaymentDal::new(state.db.clone()).delete(payment_id).await?;
    Ok(ApiResponse::<()>::no_content())
}
