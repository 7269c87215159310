use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Cached identity-provider profile. The provider remains the source of
/// truth; this row only backs display and receipts.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or refresh the cached profile (upsert on id).
    async fn upsert_user(
        &self,
        user_id: &UserId,
        email: Option<&str>,
        name: Option<&str>,
    ) -> anyhow::Result<User>;

    async fn get_user(&self, user_id: &UserId) -> anyhow::Result<Option<User>>;
}

#[async_trait]
pub trait UserService: Send + Sync {
    /// Refresh the cached profile after an identity-provider login.
    async fn sync_profile(
        &self,
        user_id: &UserId,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<User, UserError>;

    async fn get_user(&self, user_id: &UserId) -> Result<User, UserError>;
}
