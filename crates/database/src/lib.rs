pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, DbPool};

use anyhow::Result;
use std::sync::Arc;

use repositories::{
    PostgresPlanRepository, PostgresQuotaLedgerRepository, PostgresSubscriptionRepository,
    PostgresTransactionRepository, PostgresTrialRepository, PostgresUserRepository,
};

/// Database service combining all repositories
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a new database service from a connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new database service from configuration
    pub async fn from_config(config: &config::DatabaseConfig) -> Result<Self> {
        let pool = create_pool(config).await?;
        Ok(Self::new(pool))
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run(&self.pool).await
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn user_repository(&self) -> Arc<dyn services::user::ports::UserRepository> {
        Arc::new(PostgresUserRepository::new(self.pool.clone()))
    }

    pub fn plan_repository(&self) -> Arc<dyn services::subscription::ports::PlanRepository> {
        Arc::new(PostgresPlanRepository::new(self.pool.clone()))
    }

    pub fn subscription_repository(
        &self,
    ) -> Arc<dyn services::subscription::ports::SubscriptionRepository> {
        Arc::new(PostgresSubscriptionRepository::new(self.pool.clone()))
    }

    pub fn transaction_repository(
        &self,
    ) -> Arc<dyn services::subscription::ports::TransactionRepository> {
        Arc::new(PostgresTransactionRepository::new(self.pool.clone()))
    }

    pub fn trial_repository(&self) -> Arc<dyn services::trial::ports::TrialRepository> {
        Arc::new(PostgresTrialRepository::new(self.pool.clone()))
    }

    pub fn quota_ledger_repository(
        &self,
    ) -> Arc<dyn services::quota::ports::QuotaLedgerRepository> {
        Arc::new(PostgresQuotaLedgerRepository::new(self.pool.clone()))
    }
}
