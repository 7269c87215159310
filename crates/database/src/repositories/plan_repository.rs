use crate::pool::DbPool;
use async_trait::async_trait;
use services::subscription::ports::{PlanRepository, SubscriptionPlan};
use services::PlanId;
use tokio_postgres::Row;

pub struct PostgresPlanRepository {
    pool: DbPool,
}

impl PostgresPlanRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const PLAN_COLUMNS: &str =
    "id, name, price_cents, currency, monthly_quota, features, created_at, updated_at";

fn plan_from_row(row: &Row) -> SubscriptionPlan {
    let features: serde_json::Value = row.get("features");
    SubscriptionPlan {
        id: row.get("id"),
        name: row.get("name"),
        price_cents: row.get("price_cents"),
        currency: row.get("currency"),
        monthly_quota: row.get("monthly_quota"),
        features: serde_json::from_value(features).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn get_plan(&self, plan_id: PlanId) -> anyhow::Result<Option<SubscriptionPlan>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                &format!("SELECT {} FROM subscription_plans WHERE id = $1", PLAN_COLUMNS),
                &[&plan_id],
            )
            .await?;

        Ok(row.as_ref().map(plan_from_row))
    }

    async fn get_plan_by_name(&self, name: &str) -> anyhow::Result<Option<SubscriptionPlan>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                &format!(
                    "SELECT {} FROM subscription_plans WHERE name = $1",
                    PLAN_COLUMNS
                ),
                &[&name],
            )
            .await?;

        Ok(row.as_ref().map(plan_from_row))
    }

    async fn list_plans(&self) -> anyhow::Result<Vec<SubscriptionPlan>> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                &format!(
                    "SELECT {} FROM subscription_plans ORDER BY price_cents ASC",
                    PLAN_COLUMNS
                ),
                &[],
            )
            .await?;

        Ok(rows.iter().map(plan_from_row).collect())
    }
}
