pub mod plan_repository;
pub mod quota_repository;
pub mod subscription_repository;
pub mod transaction_repository;
pub mod trial_repository;
pub mod user_repository;

pub use plan_repository::PostgresPlanRepository;
pub use quota_repository::PostgresQuotaLedgerRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use transaction_repository::PostgresTransactionRepository;
pub use trial_repository::PostgresTrialRepository;
pub use user_repository::PostgresUserRepository;
