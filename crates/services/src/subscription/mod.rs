pub mod plans;
pub mod ports;
pub mod service;

pub use plans::canonical_plan_name;
pub use ports::{
    NewSubscription, NewTransaction, PaymentConfirmation, PaymentOutcome, PlanRepository,
    StoreTransactionResult, SubscriptionError, SubscriptionPlan, SubscriptionRepository,
    SubscriptionService, SubscriptionStatus, SubscriptionTransaction, SubscriptionWithPlan,
    TransactionRepository, UserSubscription,
};
pub use service::{SubscriptionServiceConfig, SubscriptionServiceImpl};
