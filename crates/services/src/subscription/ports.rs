use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PlanId, SubscriptionId, TransactionId, UserId};

/// Length of one billing cycle in days; end dates are recomputed from this
/// on creation and reactivation.
pub const BILLING_CYCLE_DAYS: i64 = 30;

/// Subscription lifecycle state. Transitions are one-directional in the
/// simple path: active → paused → active, active → cancelled, and an
/// explicit cancelled → active reactivation.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sellable plan. Seeded by migrations; price/feature mutation is an
/// administrative concern outside this service.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: PlanId,
    pub name: String,
    pub price_cents: i64,
    pub currency: String,
    pub monthly_quota: i32,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored subscription row.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSubscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub quota_used: i32,
    pub monthly_quota: i32,
    pub last_quota_reset: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resumed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscription row enriched with the plan name for client display.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionWithPlan {
    #[serde(flatten)]
    pub subscription: UserSubscription,
    pub plan_name: String,
}

/// Fields for a freshly created subscription; counters start zeroed and the
/// quota window anchored at the start date.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub monthly_quota: i32,
}

/// Append-only payment record. `gateway_payment_id` carries a UNIQUE index
/// and is the idempotency key for confirmation callbacks.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionTransaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub payment_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub payment_date: DateTime<Utc>,
}

/// Result of storing a transaction, with idempotency flag.
#[derive(Debug, Clone)]
pub struct StoreTransactionResult {
    pub transaction: SubscriptionTransaction,
    /// True if newly inserted; false if a row with this gateway payment id
    /// already existed (duplicate/retried confirmation).
    pub is_new: bool,
}

/// Verified payment-success payload handed to the service after HTTP-level
/// field validation.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub user_id: UserId,
    pub plan_name: String,
    pub amount_cents: i64,
    pub gateway_payment_id: String,
    pub gateway_order_id: String,
    pub signature: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Outcome of payment-success handling. A duplicate confirmation reports
/// success with `already_processed = true` and no new writes.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<UserSubscription>,
    pub transaction: SubscriptionTransaction,
    pub already_processed: bool,
}

/// Error types for subscription operations.
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    /// Confirmation signature did not verify against the gateway secret
    #[error("Invalid payment signature")]
    InvalidSignature,
    /// Gateway reports the payment as not captured/authorized
    #[error("Payment not settled: gateway status '{0}'")]
    PaymentNotSettled(String),
    /// No plan with the (canonicalized) name or id
    #[error("Unknown plan: {0}")]
    PlanNotFound(String),
    /// No subscription with that id for this user
    #[error("Subscription not found")]
    SubscriptionNotFound,
    /// Cancel requested on an already-cancelled subscription
    #[error("Subscription is already cancelled")]
    AlreadyCancelled,
    /// Operation requires an active subscription
    #[error("Subscription is not active")]
    NotActive,
    /// Resume requested on a subscription that is not paused
    #[error("Subscription is not paused")]
    NotPaused,
    /// Reactivate requested on a subscription that is not cancelled
    #[error("Subscription is not cancelled")]
    NotCancelled,
    /// Payment gateway credentials are missing
    #[error("Payment gateway is not configured")]
    GatewayNotConfigured,
    /// Payment gateway call failed
    #[error("Payment gateway error: {0}")]
    Gateway(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for SubscriptionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<crate::payments::GatewayError> for SubscriptionError {
    fn from(err: crate::payments::GatewayError) -> Self {
        match err {
            crate::payments::GatewayError::NotConfigured => Self::GatewayNotConfigured,
            other => Self::Gateway(other.to_string()),
        }
    }
}

/// Repository trait for plan reads.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn get_plan(&self, plan_id: PlanId) -> anyhow::Result<Option<SubscriptionPlan>>;

    async fn get_plan_by_name(&self, name: &str) -> anyhow::Result<Option<SubscriptionPlan>>;

    async fn list_plans(&self) -> anyhow::Result<Vec<SubscriptionPlan>>;
}

/// Repository trait for subscription rows.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a fresh active subscription inside the payment transaction.
    async fn insert_subscription(
        &self,
        txn: &tokio_postgres::Transaction<'_>,
        subscription: NewSubscription,
    ) -> anyhow::Result<UserSubscription>;

    /// Cancel any currently active subscriptions for the user so that at
    /// most one active row exists after the caller inserts a new one.
    async fn deactivate_active_subscriptions(
        &self,
        txn: &tokio_postgres::Transaction<'_>,
        user_id: &UserId,
    ) -> anyhow::Result<u64>;

    async fn get_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> anyhow::Result<Option<UserSubscription>>;

    async fn get_active_subscription(
        &self,
        user_id: &UserId,
    ) -> anyhow::Result<Option<UserSubscription>>;

    async fn mark_cancelled(
        &self,
        subscription_id: SubscriptionId,
    ) -> anyhow::Result<UserSubscription>;

    async fn mark_paused(
        &self,
        subscription_id: SubscriptionId,
    ) -> anyhow::Result<UserSubscription>;

    async fn mark_resumed(
        &self,
        subscription_id: SubscriptionId,
    ) -> anyhow::Result<UserSubscription>;

    /// Reactivate a cancelled subscription: status back to active, fresh
    /// billing window, quota counters restarted.
    async fn reactivate(
        &self,
        subscription_id: SubscriptionId,
        end_date: DateTime<Utc>,
    ) -> anyhow::Result<UserSubscription>;

    /// Swap the plan without touching consumed quota.
    async fn change_plan(
        &self,
        subscription_id: SubscriptionId,
        plan_id: PlanId,
        monthly_quota: i32,
    ) -> anyhow::Result<UserSubscription>;
}

/// Repository trait for the append-only payment record.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Store a transaction (idempotent via the UNIQUE index on
    /// gateway_payment_id). Returns the row and whether it was new.
    async fn store_transaction(
        &self,
        txn: &tokio_postgres::Transaction<'_>,
        transaction: NewTransaction,
    ) -> anyhow::Result<StoreTransactionResult>;

    async fn get_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> anyhow::Result<Option<SubscriptionTransaction>>;
}

/// Service trait for subscription lifecycle and payment handling.
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    /// All sellable plans.
    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, SubscriptionError>;

    /// Create a gateway order for client-side checkout of the named plan.
    async fn create_checkout_order(
        &self,
        user_id: &UserId,
        plan_name: &str,
    ) -> Result<crate::payments::GatewayOrder, SubscriptionError>;

    /// Handle a signed payment confirmation: verify, double-check capture
    /// with the gateway, then create the subscription and transaction
    /// records idempotently.
    async fn record_payment_success(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<PaymentOutcome, SubscriptionError>;

    async fn cancel_subscription(
        &self,
        user_id: &UserId,
        subscription_id: SubscriptionId,
    ) -> Result<UserSubscription, SubscriptionError>;

    async fn pause_subscription(
        &self,
        user_id: &UserId,
        subscription_id: SubscriptionId,
    ) -> Result<UserSubscription, SubscriptionError>;

    async fn resume_subscription(
        &self,
        user_id: &UserId,
        subscription_id: SubscriptionId,
    ) -> Result<UserSubscription, SubscriptionError>;

    /// Bring a cancelled subscription back: fresh 30-day billing window and
    /// a restarted quota window.
    async fn reactivate_subscription(
        &self,
        user_id: &UserId,
        subscription_id: SubscriptionId,
    ) -> Result<UserSubscription, SubscriptionError>;

    /// Swap plans mid-cycle. Quota already consumed under the old plan is
    /// not prorated.
    async fn change_plan(
        &self,
        user_id: &UserId,
        subscription_id: SubscriptionId,
        new_plan_id: PlanId,
    ) -> Result<UserSubscription, SubscriptionError>;

    /// The user's active subscription with plan name, if any.
    async fn subscription_status(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionWithPlan>, SubscriptionError>;
}
