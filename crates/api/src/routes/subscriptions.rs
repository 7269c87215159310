use crate::routes::payments::map_subscription_error;
use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use services::subscription::ports::{SubscriptionPlan, SubscriptionWithPlan, UserSubscription};
use services::{PlanId, SubscriptionId, UserId};
use utoipa::ToSchema;

/// Request targeting one of the user's subscriptions
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionActionRequest {
    pub user_id: String,
    pub subscription_id: String,
}

/// Request to move a subscription onto a different plan
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    pub user_id: String,
    pub subscription_id: String,
    pub new_plan_id: String,
}

/// Response wrapping the updated subscription
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub message: String,
    pub subscription: UserSubscription,
}

/// Response containing the user's active subscription, if any
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    pub has_active_subscription: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionWithPlan>,
}

/// Response containing available subscription plans
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListPlansResponse {
    pub plans: Vec<SubscriptionPlan>,
}

/// Query parameters for subscription status
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusParams {
    pub user_id: String,
}

fn parse_action(req_user_id: &str, req_subscription_id: &str) -> Result<(UserId, SubscriptionId), ApiError> {
    let user_id = req_user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::bad_request("userId must not be empty"));
    }
    let subscription_id: SubscriptionId = req_subscription_id
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("subscriptionId must be a valid UUID"))?;
    Ok((UserId::from(user_id), subscription_id))
}

/// Cancel a subscription
#[utoipa::path(
    post,
    path = "/cancel-subscription",
    tag = "Subscriptions",
    request_body = SubscriptionActionRequest,
    responses(
        (status = 200, description = "Subscription cancelled", body = SubscriptionResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiErrorResponse),
        (status = 404, description = "Subscription not found", body = crate::error::ApiErrorResponse),
        (status = 409, description = "Subscription already cancelled", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn cancel_subscription(
    State(app_state): State<AppState>,
    Json(req): Json<SubscriptionActionRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let (user_id, subscription_id) = parse_action(&req.user_id, &req.subscription_id)?;

    let subscription = app_state
        .subscription_service
        .cancel_subscription(&user_id, subscription_id)
        .await
        .map_err(|e| map_subscription_error(e, "cancel subscription"))?;

    Ok(Json(SubscriptionResponse {
        message: "Subscription cancelled".to_string(),
        subscription,
    }))
}

/// Pause an active subscription
#[utoipa::path(
    post,
    path = "/pause-subscription",
    tag = "Subscriptions",
    request_body = SubscriptionActionRequest,
    responses(
        (status = 200, description = "Subscription paused", body = SubscriptionResponse),
        (status = 400, description = "Subscription is not active", body = crate::error::ApiErrorResponse),
        (status = 404, description = "Subscription not found", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn pause_subscription(
    State(app_state): State<AppState>,
    Json(req): Json<SubscriptionActionRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let (user_id, subscription_id) = parse_action(&req.user_id, &req.subscription_id)?;

    let subscription = app_state
        .subscription_service
        .pause_subscription(&user_id, subscription_id)
        .await
        .map_err(|e| map_subscription_error(e, "pause subscription"))?;

    Ok(Json(SubscriptionResponse {
        message: "Subscription paused".to_string(),
        subscription,
    }))
}

/// Resume a paused subscription
#[utoipa::path(
    post,
    path = "/resume-subscription",
    tag = "Subscriptions",
    request_body = SubscriptionActionRequest,
    responses(
        (status = 200, description = "Subscription resumed", body = SubscriptionResponse),
        (status = 400, description = "Subscription is not paused", body = crate::error::ApiErrorResponse),
        (status = 404, description = "Subscription not found", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn resume_subscription(
    State(app_state): State<AppState>,
    Json(req): Json<SubscriptionActionRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let (user_id, subscription_id) = parse_action(&req.user_id, &req.subscription_id)?;

    let subscription = app_state
        .subscription_service
        .resume_subscription(&user_id, subscription_id)
        .await
        .map_err(|e| map_subscription_error(e, "resume subscription"))?;

    Ok(Json(SubscriptionResponse {
        message: "Subscription resumed".to_string(),
        subscription,
    }))
}

/// Reactivate a cancelled subscription with a fresh billing window
#[utoipa::path(
    post,
    path = "/reactivate-subscription",
    tag = "Subscriptions",
    request_body = SubscriptionActionRequest,
    responses(
        (status = 200, description = "Subscription reactivated", body = SubscriptionResponse),
        (status = 400, description = "Subscription is not cancelled", body = crate::error::ApiErrorResponse),
        (status = 404, description = "Subscription not found", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn reactivate_subscription(
    State(app_state): State<AppState>,
    Json(req): Json<SubscriptionActionRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let (user_id, subscription_id) = parse_action(&req.user_id, &req.subscription_id)?;

    let subscription = app_state
        .subscription_service
        .reactivate_subscription(&user_id, subscription_id)
        .await
        .map_err(|e| map_subscription_error(e, "reactivate subscription"))?;

    Ok(Json(SubscriptionResponse {
        message: "Subscription reactivated".to_string(),
        subscription,
    }))
}

/// Swap a subscription onto a different plan (no proration)
#[utoipa::path(
    post,
    path = "/update-subscription",
    tag = "Subscriptions",
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Plan changed", body = SubscriptionResponse),
        (status = 400, description = "Invalid request or inactive subscription", body = crate::error::ApiErrorResponse),
        (status = 404, description = "Subscription or plan not found", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn update_subscription(
    State(app_state): State<AppState>,
    Json(req): Json<UpdateSubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let (user_id, subscription_id) = parse_action(&req.user_id, &req.subscription_id)?;
    let new_plan_id: PlanId = req
        .new_plan_id
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("newPlanId must be a valid UUID"))?;

    let subscription = app_state
        .subscription_service
        .change_plan(&user_id, subscription_id, new_plan_id)
        .await
        .map_err(|e| map_subscription_error(e, "update subscription"))?;

    Ok(Json(SubscriptionResponse {
        message: "Subscription updated".to_string(),
        subscription,
    }))
}

/// Current active subscription for a user
#[utoipa::path(
    get,
    path = "/subscription-status",
    tag = "Subscriptions",
    params(SubscriptionStatusParams),
    responses(
        (status = 200, description = "Subscription status", body = SubscriptionStatusResponse),
        (status = 400, description = "Missing userId", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn subscription_status(
    State(app_state): State<AppState>,
    Query(params): Query<SubscriptionStatusParams>,
) -> Result<Json<SubscriptionStatusResponse>, ApiError> {
    let trimmed = params.user_id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request("userId must not be empty"));
    }
    let user_id = UserId::from(trimmed);

    let subscription = app_state
        .subscription_service
        .subscription_status(&user_id)
        .await
        .map_err(|e| map_subscription_error(e, "read subscription status"))?;

    Ok(Json(SubscriptionStatusResponse {
        has_active_subscription: subscription.is_some(),
        subscription,
    }))
}

/// List available subscription plans
#[utoipa::path(
    get,
    path = "/plans",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Available plans", body = ListPlansResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn list_plans(
    State(app_state): State<AppState>,
) -> Result<Json<ListPlansResponse>, ApiError> {
    let plans = app_state
        .subscription_service
        .list_plans()
        .await
        .map_err(|e| map_subscription_error(e, "list plans"))?;

    Ok(Json(ListPlansResponse { plans }))
}

pub fn create_subscriptions_router() -> Router<AppState> {
    Router::new()
        .route("/cancel-subscription", post(cancel_subscription))
        .route("/pause-subscription", post(pause_subscription))
        .route("/resume-subscription", post(resume_subscription))
        .route("/reactivate-subscription", post(reactivate_subscription))
        .route("/update-subscription", post(update_subscription))
        .route("/subscription-status", get(subscription_status))
        .route("/plans", get(list_plans))
}
