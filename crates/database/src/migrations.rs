//! Embedded schema migrations, applied in order and recorded by name.

use crate::pool::DbPool;
use anyhow::Result;

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_create_users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT,
            name TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "0002_create_subscription_plans",
        r#"
        CREATE TABLE IF NOT EXISTS subscription_plans (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL UNIQUE,
            price_cents BIGINT NOT NULL,
            currency TEXT NOT NULL DEFAULT 'INR',
            monthly_quota INT NOT NULL,
            features JSONB NOT NULL DEFAULT '[]'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "0003_create_user_subscriptions",
        r#"
        CREATE TABLE IF NOT EXISTS user_subscriptions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id TEXT NOT NULL,
            plan_id UUID NOT NULL REFERENCES subscription_plans(id),
            status TEXT NOT NULL DEFAULT 'active',
            start_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            end_date TIMESTAMPTZ NOT NULL,
            quota_used INT NOT NULL DEFAULT 0,
            monthly_quota INT NOT NULL,
            last_quota_reset TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            paused_at TIMESTAMPTZ,
            resumed_at TIMESTAMPTZ,
            cancelled_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "0004_index_user_subscriptions",
        r#"
        CREATE INDEX IF NOT EXISTS idx_user_subscriptions_user_status
            ON user_subscriptions (user_id, status)
        "#,
    ),
    (
        "0005_create_user_trials",
        r#"
        CREATE TABLE IF NOT EXISTS user_trials (
            user_id TEXT PRIMARY KEY,
            analyses_used INT NOT NULL DEFAULT 0,
            trial_started_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "0006_create_subscription_transactions",
        r#"
        CREATE TABLE IF NOT EXISTS subscription_transactions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id TEXT NOT NULL,
            plan_id UUID NOT NULL REFERENCES subscription_plans(id),
            gateway_payment_id TEXT NOT NULL UNIQUE,
            gateway_order_id TEXT NOT NULL,
            amount_cents BIGINT NOT NULL,
            currency TEXT NOT NULL,
            status TEXT NOT NULL,
            payment_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "0007_seed_subscription_plans",
        r#"
        INSERT INTO subscription_plans (name, price_cents, currency, monthly_quota, features) VALUES
            ('Starter', 49900, 'INR', 20,
             '["20 form analyses per month", "Email support"]'::jsonb),
            ('Pro', 99900, 'INR', 100,
             '["100 form analyses per month", "Progress tracking", "Priority support"]'::jsonb),
            ('Ultimate', 199900, 'INR', 500,
             '["500 form analyses per month", "Progress tracking", "Coach review", "Priority support"]'::jsonb)
        ON CONFLICT (name) DO NOTHING
        "#,
    ),
];

/// Apply all pending migrations. Safe to run concurrently from multiple
/// processes: the ledger insert conflicts on name and the loser skips.
pub async fn run(pool: &DbPool) -> Result<()> {
    let mut client = pool.get().await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            &[],
        )
        .await?;

    for (name, sql) in MIGRATIONS {
        let txn = client.transaction().await?;

        let claimed = txn
            .execute(
                "INSERT INTO schema_migrations (name) VALUES ($1)
                 ON CONFLICT (name) DO NOTHING",
                &[name],
            )
            .await?;

        if claimed == 0 {
            txn.rollback().await?;
            continue;
        }

        tracing::info!("Applying migration {}", name);
        txn.batch_execute(sql).await?;
        txn.commit().await?;
    }

    Ok(())
}
