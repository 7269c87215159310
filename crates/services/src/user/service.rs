use super::ports::{User, UserError, UserRepository, UserService};
use crate::UserId;
use async_trait::async_trait;
use std::sync::Arc;

pub struct UserServiceImpl {
    user_repo: Arc<dyn UserRepository>,
}

impl UserServiceImpl {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn sync_profile(
        &self,
        user_id: &UserId,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<User, UserError> {
        tracing::debug!("Syncing cached profile for user_id={}", user_id);
        Ok(self.user_repo.upsert_user(user_id, email, name).await?)
    }

    async fn get_user(&self, user_id: &UserId) -> Result<User, UserError> {
        self.user_repo
            .get_user(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }
}
