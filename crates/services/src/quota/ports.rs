use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SubscriptionId, UserId};

/// Length of a quota billing window in days. The reset anchor advances by
/// exactly this much when a consume crosses the boundary.
pub const QUOTA_WINDOW_DAYS: i64 = 30;

/// Quota counters for an active subscription, as stored.
#[derive(Debug, Clone)]
pub struct QuotaWindow {
    pub subscription_id: SubscriptionId,
    pub quota_used: i32,
    pub monthly_quota: i32,
    pub last_quota_reset: DateTime<Utc>,
}

impl QuotaWindow {
    /// Date at which the current window rolls over.
    pub fn reset_date(&self) -> DateTime<Utc> {
        self.last_quota_reset + chrono::Duration::days(QUOTA_WINDOW_DAYS)
    }
}

/// Successful consumption result returned to callers.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaConsumption {
    pub quota_used: i32,
    pub quota_limit: i32,
    pub quota_remaining: i32,
    pub reset_date: DateTime<Utc>,
}

/// Error types for quota ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// User has no active subscription to draw quota from
    #[error("No active subscription found")]
    NoActiveSubscription,
    /// Monthly allowance exhausted; no mutation occurred
    #[error("Monthly quota exhausted: used {quota_used} of {quota_limit}")]
    QuotaExhausted {
        quota_used: i32,
        quota_limit: i32,
        reset_date: DateTime<Utc>,
    },
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for QuotaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Repository trait for the paid-plan quota ledger. Both operations target
/// the user's single active subscription row.
#[async_trait]
pub trait QuotaLedgerRepository: Send + Sync {
    /// Quota counters of the user's active subscription, if any.
    async fn get_active_window(&self, user_id: &UserId) -> anyhow::Result<Option<QuotaWindow>>;

    /// Atomically consume one unit of quota. The statement folds in the
    /// 30-day rollover: crossing the boundary zeroes the counter and
    /// advances the anchor before consuming, all in one conditional UPDATE.
    /// Returns None (and writes nothing) when the allowance is exhausted.
    async fn consume_one(
        &self,
        subscription_id: SubscriptionId,
    ) -> anyhow::Result<Option<QuotaWindow>>;
}

/// Service trait for the paid-plan quota ledger.
#[async_trait]
pub trait QuotaService: Send + Sync {
    /// Check-and-consume one analysis against the user's active plan.
    async fn check_and_consume(&self, user_id: &UserId) -> Result<QuotaConsumption, QuotaError>;
}
