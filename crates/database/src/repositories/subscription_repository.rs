use crate::pool::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use services::subscription::ports::{
    NewSubscription, SubscriptionRepository, SubscriptionStatus, UserSubscription,
};
use services::{PlanId, SubscriptionId, UserId};
use tokio_postgres::Row;

pub struct PostgresSubscriptionRepository {
    pool: DbPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan_id, status, start_date, end_date, \
     quota_used, monthly_quota, last_quota_reset, paused_at, resumed_at, cancelled_at, \
     created_at, updated_at";

fn subscription_from_row(row: &Row) -> anyhow::Result<UserSubscription> {
    let status: String = row.get("status");
    let status = SubscriptionStatus::parse(&status)
        .ok_or_else(|| anyhow::anyhow!("Unknown subscription status in storage: {}", status))?;

    Ok(UserSubscription {
        id: row.get("id"),
        user_id: row.get("user_id"),
        plan_id: row.get("plan_id"),
        status,
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        quota_used: row.get("quota_used"),
        monthly_quota: row.get("monthly_quota"),
        last_quota_reset: row.get("last_quota_reset"),
        paused_at: row.get("paused_at"),
        resumed_at: row.get("resumed_at"),
        cancelled_at: row.get("cancelled_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn insert_subscription(
        &self,
        txn: &tokio_postgres::Transaction<'_>,
        subscription: NewSubscription,
    ) -> anyhow::Result<UserSubscription> {
        tracing::info!(
            "Repository: Inserting subscription - user_id={}, plan_id={}",
            subscription.user_id,
            subscription.plan_id
        );

        let row = txn
            .query_one(
                &format!(
                    "INSERT INTO user_subscriptions (
                        user_id, plan_id, status, start_date, end_date,
                        quota_used, monthly_quota, last_quota_reset
                     )
                     VALUES ($1, $2, 'active', $3, $4, 0, $5, $3)
                     RETURNING {}",
                    SUBSCRIPTION_COLUMNS
                ),
                &[
                    &subscription.user_id,
                    &subscription.plan_id,
                    &subscription.start_date,
                    &subscription.end_date,
                    &subscription.monthly_quota,
                ],
            )
            .await?;

        subscription_from_row(&row)
    }

    async fn deactivate_active_subscriptions(
        &self,
        txn: &tokio_postgres::Transaction<'_>,
        user_id: &UserId,
    ) -> anyhow::Result<u64> {
        let affected = txn
            .execute(
                "UPDATE user_subscriptions
                 SET status = 'cancelled', cancelled_at = NOW(), updated_at = NOW()
                 WHERE user_id = $1 AND status = 'active'",
                &[&user_id],
            )
            .await?;

        Ok(affected)
    }

    async fn get_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> anyhow::Result<Option<UserSubscription>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                &format!(
                    "SELECT {} FROM user_subscriptions WHERE id = $1",
                    SUBSCRIPTION_COLUMNS
                ),
                &[&subscription_id],
            )
            .await?;

        row.as_ref().map(subscription_from_row).transpose()
    }

    async fn get_active_subscription(
        &self,
        user_id: &UserId,
    ) -> anyhow::Result<Option<UserSubscription>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                &format!(
                    "SELECT {} FROM user_subscriptions
                     WHERE user_id = $1 AND status = 'active'
                     ORDER BY created_at DESC
                     LIMIT 1",
                    SUBSCRIPTION_COLUMNS
                ),
                &[&user_id],
            )
            .await?;

        row.as_ref().map(subscription_from_row).transpose()
    }

    async fn mark_cancelled(
        &self,
        subscription_id: SubscriptionId,
    ) -> anyhow::Result<UserSubscription> {
        let client = self.pool.get().await?;

        let row = client
            .query_one(
                &format!(
                    "UPDATE user_subscriptions
                     SET status = 'cancelled', cancelled_at = NOW(), updated_at = NOW()
                     WHERE id = $1
                     RETURNING {}",
                    SUBSCRIPTION_COLUMNS
                ),
                &[&subscription_id],
            )
            .await?;

        subscription_from_row(&row)
    }

    async fn mark_paused(
        &self,
        subscription_id: SubscriptionId,
    ) -> anyhow::Result<UserSubscription> {
        let client = self.pool.get().await?;

        let row = client
            .query_one(
                &format!(
                    "UPDATE user_subscriptions
                     SET status = 'paused', paused_at = NOW(), updated_at = NOW()
                     WHERE id = $1
                     RETURNING {}",
                    SUBSCRIPTION_COLUMNS
                ),
                &[&subscription_id],
            )
            .await?;

        subscription_from_row(&row)
    }

    async fn mark_resumed(
        &self,
        subscription_id: SubscriptionId,
    ) -> anyhow::Result<UserSubscription> {
        let client = self.pool.get().await?;

        let row = client
            .query_one(
                &format!(
                    "UPDATE user_subscriptions
                     SET status = 'active', resumed_at = NOW(), updated_at = NOW()
                     WHERE id = $1
                     RETURNING {}",
                    SUBSCRIPTION_COLUMNS
                ),
                &[&subscription_id],
            )
            .await?;

        subscription_from_row(&row)
    }

    async fn reactivate(
        &self,
        subscription_id: SubscriptionId,
        end_date: DateTime<Utc>,
    ) -> anyhow::Result<UserSubscription> {
        tracing::info!(
            "Repository: Reactivating subscription - subscription_id={}",
            subscription_id
        );

        let client = self.pool.get().await?;

        // Fresh billing window: counters restart, lifecycle marks cleared
        let row = client
            .query_one(
                &format!(
                    "UPDATE user_subscriptions
                     SET status = 'active',
                         start_date = NOW(),
                         end_date = $2,
                         quota_used = 0,
                         last_quota_reset = NOW(),
                         paused_at = NULL,
                         resumed_at = NULL,
                         cancelled_at = NULL,
                         updated_at = NOW()
                     WHERE id = $1
                     RETURNING {}",
                    SUBSCRIPTION_COLUMNS
                ),
                &[&subscription_id, &end_date],
            )
            .await?;

        subscription_from_row(&row)
    }

    async fn change_plan(
        &self,
        subscription_id: SubscriptionId,
        plan_id: PlanId,
        monthly_quota: i32,
    ) -> anyhow::Result<UserSubscription> {
        let client = self.pool.get().await?;

        let row = client
            .query_one(
                &format!(
                    "UPDATE user_subscriptions
                     SET plan_id = $2, monthly_quota = $3, updated_at = NOW()
                     WHERE id = $1
                     RETURNING {}",
                    SUBSCRIPTION_COLUMNS
                ),
                &[&subscription_id, &plan_id, &monthly_quota],
            )
            .await?;

        subscription_from_row(&row)
    }
}
