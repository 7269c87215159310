use crate::pool::DbPool;
use async_trait::async_trait;
use services::quota::ports::{QuotaLedgerRepository, QuotaWindow, QUOTA_WINDOW_DAYS};
use services::{SubscriptionId, UserId};
use tokio_postgres::Row;

pub struct PostgresQuotaLedgerRepository {
    pool: DbPool,
}

impl PostgresQuotaLedgerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn window_from_row(row: &Row) -> QuotaWindow {
    QuotaWindow {
        subscription_id: row.get("id"),
        quota_used: row.get("quota_used"),
        monthly_quota: row.get("monthly_quota"),
        last_quota_reset: row.get("last_quota_reset"),
    }
}

#[async_trait]
impl QuotaLedgerRepository for PostgresQuotaLedgerRepository {
    async fn get_active_window(&self, user_id: &UserId) -> anyhow::Result<Option<QuotaWindow>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, quota_used, monthly_quota, last_quota_reset
                 FROM user_subscriptions
                 WHERE user_id = $1 AND status = 'active'
                 ORDER BY created_at DESC
                 LIMIT 1",
                &[&user_id],
            )
            .await?;

        Ok(row.as_ref().map(window_from_row))
    }

    async fn consume_one(
        &self,
        subscription_id: SubscriptionId,
    ) -> anyhow::Result<Option<QuotaWindow>> {
        let client = self.pool.get().await?;
        let window_days = QUOTA_WINDOW_DAYS as i32;

        // Single conditional UPDATE: rollover and consume in one statement so
        // concurrent requests cannot overshoot the allowance. A row past its
        // reset date restarts at quota_used = 1; otherwise the row is only
        // matched while quota remains.
        let row = client
            .query_opt(
                "UPDATE user_subscriptions
                 SET quota_used = CASE
                         WHEN NOW() >= last_quota_reset + make_interval(days => $2)
                             THEN 1
                         ELSE quota_used + 1
                     END,
                     last_quota_reset = CASE
                         WHEN NOW() >= last_quota_reset + make_interval(days => $2)
                             THEN NOW()
                         ELSE last_quota_reset
                     END,
                     updated_at = NOW()
                 WHERE id = $1
                   AND status = 'active'
                   AND (quota_used < monthly_quota
                        OR NOW() >= last_quota_reset + make_interval(days => $2))
                 RETURNING id, quota_used, monthly_quota, last_quota_reset",
                &[&subscription_id, &window_days],
            )
            .await?;

        Ok(row.as_ref().map(window_from_row))
    }
}
