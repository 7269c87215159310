use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Lifetime number of free analyses available to a user with no paid plan.
pub const FREE_TRIAL_ANALYSES_LIMIT: i32 = 2;

/// Stored trial row, created lazily on first check.
#[derive(Debug, Clone)]
pub struct TrialRecord {
    pub user_id: UserId,
    pub analyses_used: i32,
    pub trial_started_at: DateTime<Utc>,
}

/// Trial state returned to callers. `analyses_used` is always clamped to the limit.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialStatus {
    pub is_on_free_trial: bool,
    pub analyses_used: i32,
    pub analyses_limit: i32,
    pub analyses_remaining: i32,
    pub trial_ended: bool,
    pub trial_started_at: DateTime<Utc>,
}

/// Error types for trial ledger operations. A transient storage failure must
/// surface as an error; it is never conflated with "new user".
#[derive(Debug, thiserror::Error)]
pub enum TrialError {
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for TrialError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Repository trait for the free-trial ledger.
#[async_trait]
pub trait TrialRepository: Send + Sync {
    /// Fetch the trial row for a user, inserting a zero-usage row if none
    /// exists (idempotent via `ON CONFLICT DO NOTHING`).
    async fn get_or_create(&self, user_id: &UserId) -> anyhow::Result<TrialRecord>;

    /// Repair a stored counter that drifted above the limit. Returns the
    /// updated row, or None when no repair was needed.
    async fn clamp_to_limit(
        &self,
        user_id: &UserId,
        limit: i32,
    ) -> anyhow::Result<Option<TrialRecord>>;

    /// Increment usage by exactly one, but only while below the limit
    /// (`UPDATE ... WHERE analyses_used < limit`). Returns None when the
    /// counter is already at the limit, in which case nothing was written.
    async fn increment_if_below(
        &self,
        user_id: &UserId,
        limit: i32,
    ) -> anyhow::Result<Option<TrialRecord>>;
}

/// Service trait for the free-trial ledger.
#[async_trait]
pub trait TrialService: Send + Sync {
    /// Current trial state for a user; creates the record on first sight.
    async fn check_trial(&self, user_id: &UserId) -> Result<TrialStatus, TrialError>;

    /// Consume one trial analysis. At the limit this returns the capped
    /// state with `trial_ended = true` and does not increment.
    async fn increment_trial(&self, user_id: &UserId) -> Result<TrialStatus, TrialError>;
}
