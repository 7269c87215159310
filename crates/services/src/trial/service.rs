use super::ports::{
    TrialError, TrialRecord, TrialRepository, TrialService, TrialStatus,
    FREE_TRIAL_ANALYSES_LIMIT,
};
use crate::UserId;
use async_trait::async_trait;
use std::sync::Arc;

pub struct TrialServiceImpl {
    trial_repo: Arc<dyn TrialRepository>,
}

impl TrialServiceImpl {
    pub fn new(trial_repo: Arc<dyn TrialRepository>) -> Self {
        Self { trial_repo }
    }

    fn status_from_record(record: &TrialRecord) -> TrialStatus {
        // Reads never report more than the limit even if the stored row drifted
        let used = record.analyses_used.min(FREE_TRIAL_ANALYSES_LIMIT);
        let remaining = FREE_TRIAL_ANALYSES_LIMIT - used;
        TrialStatus {
            is_on_free_trial: remaining > 0,
            analyses_used: used,
            analyses_limit: FREE_TRIAL_ANALYSES_LIMIT,
            analyses_remaining: remaining,
            trial_ended: remaining == 0,
            trial_started_at: record.trial_started_at,
        }
    }
}

#[async_trait]
impl TrialService for TrialServiceImpl {
    async fn check_trial(&self, user_id: &UserId) -> Result<TrialStatus, TrialError> {
        let record = self.trial_repo.get_or_create(user_id).await?;

        // Repair drift from any external bug before responding
        let record = if record.analyses_used > FREE_TRIAL_ANALYSES_LIMIT {
            tracing::warn!(
                "Trial counter drifted above limit, repairing: user_id={}, stored={}",
                user_id,
                record.analyses_used
            );
            self.trial_repo
                .clamp_to_limit(user_id, FREE_TRIAL_ANALYSES_LIMIT)
                .await?
                .unwrap_or(record)
        } else {
            record
        };

        Ok(Self::status_from_record(&record))
    }

    async fn increment_trial(&self, user_id: &UserId) -> Result<TrialStatus, TrialError> {
        // Ensure the row exists so the conditional update has something to match
        let existing = self.trial_repo.get_or_create(user_id).await?;

        match self
            .trial_repo
            .increment_if_below(user_id, FREE_TRIAL_ANALYSES_LIMIT)
            .await?
        {
            Some(record) => {
                tracing::info!(
                    "Trial analysis consumed: user_id={}, analyses_used={}/{}",
                    user_id,
                    record.analyses_used,
                    FREE_TRIAL_ANALYSES_LIMIT
                );
                Ok(Self::status_from_record(&record))
            }
            None => {
                // Already at the limit: report the capped state, no write
                tracing::info!("Trial exhausted, increment refused: user_id={}", user_id);
                let mut status = Self::status_from_record(&existing);
                status.trial_ended = true;
                status.is_on_free_trial = false;
                status.analyses_used = FREE_TRIAL_ANALYSES_LIMIT;
                status.analyses_remaining = 0;
                Ok(status)
            }
        }
    }
}
