use crate::{error::ApiError, state::AppState};
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use services::trial::ports::{TrialError, TrialStatus};
use services::UserId;
use utoipa::ToSchema;

/// Request identifying the trial user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrialRequest {
    /// Identity-provider user id
    pub user_id: String,
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request("userId must not be empty"));
    }
    Ok(UserId::from(trimmed))
}

fn map_trial_error(err: TrialError) -> ApiError {
    match err {
        TrialError::Storage(msg) => {
            tracing::error!(error = ?msg, "Storage error in trial ledger");
            ApiError::internal_server_error("Failed to read trial state")
        }
    }
}

/// Check a user's free-trial allowance (creates the record on first sight)
#[utoipa::path(
    post,
    path = "/check-free-trial",
    tag = "Trial",
    request_body = TrialRequest,
    responses(
        (status = 200, description = "Trial status", body = TrialStatus),
        (status = 400, description = "Missing or malformed userId", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn check_free_trial(
    State(app_state): State<AppState>,
    Json(req): Json<TrialRequest>,
) -> Result<Json<TrialStatus>, ApiError> {
    let user_id = parse_user_id(&req.user_id)?;
    tracing::debug!("Checking free trial for user_id={}", user_id);

    let status = app_state
        .trial_service
        .check_trial(&user_id)
        .await
        .map_err(map_trial_error)?;

    Ok(Json(status))
}

/// Consume one free-trial analysis
#[utoipa::path(
    post,
    path = "/update-free-trial",
    tag = "Trial",
    request_body = TrialRequest,
    responses(
        (status = 200, description = "Updated trial status (capped state when exhausted)", body = TrialStatus),
        (status = 400, description = "Missing or malformed userId", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn update_free_trial(
    State(app_state): State<AppState>,
    Json(req): Json<TrialRequest>,
) -> Result<Json<TrialStatus>, ApiError> {
    let user_id = parse_user_id(&req.user_id)?;
    tracing::info!("Consuming free-trial analysis for user_id={}", user_id);

    let status = app_state
        .trial_service
        .increment_trial(&user_id)
        .await
        .map_err(map_trial_error)?;

    Ok(Json(status))
}

pub fn create_trial_router() -> Router<AppState> {
    Router::new()
        .route("/check-free-trial", post(check_free_trial))
        .route("/update-free-trial", post(update_free_trial))
}
