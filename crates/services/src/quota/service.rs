use super::ports::{
    QuotaConsumption, QuotaError, QuotaLedgerRepository, QuotaService, QuotaWindow,
};
use crate::UserId;
use async_trait::async_trait;
use std::sync::Arc;

pub struct QuotaServiceImpl {
    quota_repo: Arc<dyn QuotaLedgerRepository>,
}

impl QuotaServiceImpl {
    pub fn new(quota_repo: Arc<dyn QuotaLedgerRepository>) -> Self {
        Self { quota_repo }
    }

    fn consumption_from_window(window: &QuotaWindow) -> QuotaConsumption {
        QuotaConsumption {
            quota_used: window.quota_used,
            quota_limit: window.monthly_quota,
            quota_remaining: (window.monthly_quota - window.quota_used).max(0),
            reset_date: window.reset_date(),
        }
    }
}

#[async_trait]
impl QuotaService for QuotaServiceImpl {
    async fn check_and_consume(&self, user_id: &UserId) -> Result<QuotaConsumption, QuotaError> {
        let window = self
            .quota_repo
            .get_active_window(user_id)
            .await?
            .ok_or(QuotaError::NoActiveSubscription)?;

        match self.quota_repo.consume_one(window.subscription_id).await? {
            Some(updated) => {
                tracing::info!(
                    "Quota consumed: user_id={}, subscription_id={}, used={}/{}",
                    user_id,
                    updated.subscription_id,
                    updated.quota_used,
                    updated.monthly_quota
                );
                Ok(Self::consumption_from_window(&updated))
            }
            None => {
                // The conditional update matched nothing: allowance exhausted.
                // Re-read for accurate counters; the row itself was not touched.
                let current = self
                    .quota_repo
                    .get_active_window(user_id)
                    .await?
                    .ok_or(QuotaError::NoActiveSubscription)?;

                tracing::info!(
                    "Quota exhausted, consume refused: user_id={}, used={}/{}",
                    user_id,
                    current.quota_used,
                    current.monthly_quota
                );
                Err(QuotaError::QuotaExhausted {
                    quota_used: current.quota_used,
                    quota_limit: current.monthly_quota,
                    reset_date: current.reset_date(),
                })
            }
        }
    }
}
