use crate::{error::ApiError, state::AppState};
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use services::user::ports::{User, UserError};
use services::UserId;
use utoipa::ToSchema;

/// Cached profile refresh after an identity-provider login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncProfileRequest {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Refresh the cached display name/email for a user
#[utoipa::path(
    post,
    path = "/sync-profile",
    tag = "Users",
    request_body = SyncProfileRequest,
    responses(
        (status = 200, description = "Cached profile updated", body = User),
        (status = 400, description = "Missing or malformed userId", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn sync_profile(
    State(app_state): State<AppState>,
    Json(req): Json<SyncProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let trimmed = req.user_id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request("userId must not be empty"));
    }
    let user_id = UserId::from(trimmed);

    let user = app_state
        .user_service
        .sync_profile(&user_id, req.email.as_deref(), req.name.as_deref())
        .await
        .map_err(|e| match e {
            UserError::NotFound => ApiError::not_found("User not found"),
            UserError::Storage(msg) => {
                tracing::error!(error = ?msg, "Storage error syncing profile");
                ApiError::internal_server_error("Failed to sync profile")
            }
        })?;

    Ok(Json(user))
}

pub fn create_users_router() -> Router<AppState> {
    Router::new().route("/sync-profile", post(sync_profile))
}
