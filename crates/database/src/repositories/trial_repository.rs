use crate::pool::DbPool;
use async_trait::async_trait;
use services::trial::ports::{TrialRecord, TrialRepository};
use services::UserId;
use tokio_postgres::Row;

pub struct PostgresTrialRepository {
    pool: DbPool,
}

impl PostgresTrialRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &Row) -> TrialRecord {
    TrialRecord {
        user_id: row.get("user_id"),
        analyses_used: row.get("analyses_used"),
        trial_started_at: row.get("trial_started_at"),
    }
}

#[async_trait]
impl TrialRepository for PostgresTrialRepository {
    async fn get_or_create(&self, user_id: &UserId) -> anyhow::Result<TrialRecord> {
        let client = self.pool.get().await?;

        // Idempotent create: the UNIQUE constraint decides who wins a race
        let result = client
            .query_opt(
                "INSERT INTO user_trials (user_id)
                 VALUES ($1)
                 ON CONFLICT (user_id) DO NOTHING
                 RETURNING user_id, analyses_used, trial_started_at",
                &[&user_id],
            )
            .await?;

        if let Some(row) = result {
            tracing::debug!("Repository: Created trial record - user_id={}", user_id);
            return Ok(record_from_row(&row));
        }

        let row = client
            .query_one(
                "SELECT user_id, analyses_used, trial_started_at
                 FROM user_trials
                 WHERE user_id = $1",
                &[&user_id],
            )
            .await?;

        Ok(record_from_row(&row))
    }

    async fn clamp_to_limit(
        &self,
        user_id: &UserId,
        limit: i32,
    ) -> anyhow::Result<Option<TrialRecord>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "UPDATE user_trials
                 SET analyses_used = $2
                 WHERE user_id = $1 AND analyses_used > $2
                 RETURNING user_id, analyses_used, trial_started_at",
                &[&user_id, &limit],
            )
            .await?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn increment_if_below(
        &self,
        user_id: &UserId,
        limit: i32,
    ) -> anyhow::Result<Option<TrialRecord>> {
        let client = self.pool.get().await?;

        // Conditional increment: never moves the counter past the limit,
        // even under concurrent requests
        let row = client
            .query_opt(
                "UPDATE user_trials
                 SET analyses_used = analyses_used + 1
                 WHERE user_id = $1 AND analyses_used < $2
                 RETURNING user_id, analyses_used, trial_started_at",
                &[&user_id, &limit],
            )
            .await?;

        Ok(row.as_ref().map(record_from_row))
    }
}
