use crate::{error::ApiError, state::AppState};
use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use services::payments::GatewayOrder;
use services::subscription::ports::{
    PaymentConfirmation, SubscriptionError, SubscriptionTransaction, UserSubscription,
};
use services::UserId;
use utoipa::ToSchema;

/// Request to create a gateway order for checkout
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: String,
    /// Plan name (e.g. "Pro"); historic aliases are accepted
    pub plan_name: String,
}

/// Response containing the gateway order for client-side checkout
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order: GatewayOrder,
}

/// Signed payment confirmation posted after checkout completes
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSuccessRequest {
    pub user_id: String,
    pub plan_name: String,
    /// Amount paid, in the smallest currency unit
    pub amount: i64,
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    /// HMAC signature over "orderId|paymentId"
    pub signature: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Result of payment confirmation handling
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSuccessResponse {
    pub message: String,
    /// True when this gateway payment id was already processed
    pub already_processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<UserSubscription>,
    pub transaction: SubscriptionTransaction,
}

fn validate_not_empty(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub(crate) fn map_subscription_error(err: SubscriptionError, operation: &str) -> ApiError {
    match err {
        SubscriptionError::InvalidSignature => ApiError::invalid_payment_signature(),
        SubscriptionError::PaymentNotSettled(status) => ApiError::bad_request(format!(
            "Payment is not captured (gateway status '{}')",
            status
        )),
        SubscriptionError::PlanNotFound(plan) => {
            ApiError::not_found(format!("Unknown plan: {}", plan))
        }
        SubscriptionError::SubscriptionNotFound => ApiError::not_found("Subscription not found"),
        SubscriptionError::AlreadyCancelled => {
            ApiError::conflict("Subscription is already cancelled")
        }
        SubscriptionError::NotActive => ApiError::bad_request("Subscription is not active"),
        SubscriptionError::NotPaused => ApiError::bad_request("Subscription is not paused"),
        SubscriptionError::NotCancelled => {
            ApiError::bad_request("Only a cancelled subscription can be reactivated")
        }
        SubscriptionError::GatewayNotConfigured => {
            ApiError::service_unavailable("Payment gateway is not configured")
        }
        SubscriptionError::Gateway(msg) => {
            tracing::error!(error = ?msg, "Gateway error during {}", operation);
            ApiError::bad_gateway("Payment gateway request failed")
        }
        SubscriptionError::Database(msg) => {
            tracing::error!(error = ?msg, "Database error during {}", operation);
            ApiError::internal_server_error(format!("Failed to {}", operation))
        }
        SubscriptionError::Internal(msg) => {
            tracing::error!(error = ?msg, "Internal error during {}", operation);
            ApiError::internal_server_error(format!("Failed to {}", operation))
        }
    }
}

/// Create a payment gateway order for checkout
#[utoipa::path(
    post,
    path = "/create-order",
    tag = "Payments",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = CreateOrderResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiErrorResponse),
        (status = 404, description = "Unknown plan", body = crate::error::ApiErrorResponse),
        (status = 502, description = "Gateway request failed", body = crate::error::ApiErrorResponse),
        (status = 503, description = "Gateway not configured", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    validate_not_empty(&req.user_id, "userId")?;
    validate_not_empty(&req.plan_name, "planName")?;
    let user_id = UserId::from(req.user_id.trim());

    let order = app_state
        .subscription_service
        .create_checkout_order(&user_id, req.plan_name.trim())
        .await
        .map_err(|e| map_subscription_error(e, "create order"))?;

    Ok(Json(CreateOrderResponse { order }))
}

/// Handle a signed payment confirmation from the checkout flow
#[utoipa::path(
    post,
    path = "/payment-success",
    tag = "Payments",
    request_body = PaymentSuccessRequest,
    responses(
        (status = 200, description = "Subscription and transaction recorded (idempotent)", body = PaymentSuccessResponse),
        (status = 400, description = "Invalid request or payment not captured", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Signature verification failed", body = crate::error::ApiErrorResponse),
        (status = 404, description = "Unknown plan", body = crate::error::ApiErrorResponse),
        (status = 502, description = "Gateway request failed", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn payment_success(
    State(app_state): State<AppState>,
    Json(req): Json<PaymentSuccessRequest>,
) -> Result<Json<PaymentSuccessResponse>, ApiError> {
    validate_not_empty(&req.user_id, "userId")?;
    validate_not_empty(&req.plan_name, "planName")?;
    validate_not_empty(&req.gateway_payment_id, "gatewayPaymentId")?;
    validate_not_empty(&req.gateway_order_id, "gatewayOrderId")?;
    validate_not_empty(&req.signature, "signature")?;
    if req.amount <= 0 {
        return Err(ApiError::bad_request("amount must be positive"));
    }

    let outcome = app_state
        .subscription_service
        .record_payment_success(PaymentConfirmation {
            user_id: UserId::from(req.user_id.trim()),
            plan_name: req.plan_name.trim().to_string(),
            amount_cents: req.amount,
            gateway_payment_id: req.gateway_payment_id.trim().to_string(),
            gateway_order_id: req.gateway_order_id.trim().to_string(),
            signature: req.signature.trim().to_string(),
            start_date: req.start_date,
            end_date: req.end_date,
        })
        .await
        .map_err(|e| map_subscription_error(e, "process payment"))?;

    let message = if outcome.already_processed {
        "Payment already processed".to_string()
    } else {
        "Subscription activated".to_string()
    };

    Ok(Json(PaymentSuccessResponse {
        message,
        already_processed: outcome.already_processed,
        subscription: outcome.subscription,
        transaction: outcome.transaction,
    }))
}

pub fn create_payments_router() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(create_order))
        .route("/payment-success", post(payment_success))
}
