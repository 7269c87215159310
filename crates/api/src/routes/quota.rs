use crate::{error::ApiError, state::AppState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use services::quota::ports::QuotaError;
use services::UserId;
use utoipa::ToSchema;

/// Request identifying the subscribed user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotaRequest {
    /// Identity-provider user id
    pub user_id: String,
}

/// Quota state after a check-and-consume attempt
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatusResponse {
    /// Whether one analysis was consumed
    pub success: bool,
    pub quota_used: i32,
    pub quota_limit: i32,
    pub quota_remaining: i32,
    pub reset_date: DateTime<Utc>,
    /// Present (true) when the allowance is exhausted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_upgrade: Option<bool>,
}

/// Atomically consume one analysis against the user's active plan
#[utoipa::path(
    post,
    path = "/check-quota",
    tag = "Quota",
    request_body = QuotaRequest,
    responses(
        (status = 200, description = "Quota consumed", body = QuotaStatusResponse),
        (status = 400, description = "Missing or malformed userId", body = crate::error::ApiErrorResponse),
        (status = 403, description = "Quota exhausted, upgrade required", body = QuotaStatusResponse),
        (status = 404, description = "No active subscription", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn check_quota(
    State(app_state): State<AppState>,
    Json(req): Json<QuotaRequest>,
) -> Result<Response, ApiError> {
    let trimmed = req.user_id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request("userId must not be empty"));
    }
    let user_id = UserId::from(trimmed);

    tracing::debug!("Checking quota for user_id={}", user_id);

    match app_state.quota_service.check_and_consume(&user_id).await {
        Ok(consumption) => Ok(Json(QuotaStatusResponse {
            success: true,
            quota_used: consumption.quota_used,
            quota_limit: consumption.quota_limit,
            quota_remaining: consumption.quota_remaining,
            reset_date: consumption.reset_date,
            requires_upgrade: None,
        })
        .into_response()),
        Err(QuotaError::QuotaExhausted {
            quota_used,
            quota_limit,
            reset_date,
        }) => Ok((
            StatusCode::FORBIDDEN,
            Json(QuotaStatusResponse {
                success: false,
                quota_used,
                quota_limit,
                quota_remaining: 0,
                reset_date,
                requires_upgrade: Some(true),
            }),
        )
            .into_response()),
        Err(QuotaError::NoActiveSubscription) => {
            Err(ApiError::not_found("No active subscription found"))
        }
        Err(QuotaError::Storage(msg)) => {
            tracing::error!(error = ?msg, "Storage error in quota ledger");
            Err(ApiError::internal_server_error("Failed to consume quota"))
        }
    }
}

pub fn create_quota_router() -> Router<AppState> {
    Router::new().route("/check-quota", post(check_quota))
}
