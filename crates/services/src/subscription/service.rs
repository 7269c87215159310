use super::plans::canonical_plan_name;
use super::ports::{
    NewSubscription, NewTransaction, PaymentConfirmation, PaymentOutcome, PlanRepository,
    SubscriptionError, SubscriptionPlan, SubscriptionRepository, SubscriptionService,
    SubscriptionStatus, SubscriptionWithPlan, TransactionRepository, UserSubscription,
    BILLING_CYCLE_DAYS,
};
use crate::payments::{GatewayOrder, PaymentGateway};
use crate::user::ports::UserRepository;
use crate::{PlanId, SubscriptionId, UserId};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Configuration for SubscriptionServiceImpl
pub struct SubscriptionServiceConfig {
    pub db_pool: deadpool_postgres::Pool,
    pub plan_repo: Arc<dyn PlanRepository>,
    pub subscription_repo: Arc<dyn SubscriptionRepository>,
    pub transaction_repo: Arc<dyn TransactionRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
}

pub struct SubscriptionServiceImpl {
    db_pool: deadpool_postgres::Pool,
    plan_repo: Arc<dyn PlanRepository>,
    subscription_repo: Arc<dyn SubscriptionRepository>,
    transaction_repo: Arc<dyn TransactionRepository>,
    user_repo: Arc<dyn UserRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl SubscriptionServiceImpl {
    pub fn new(config: SubscriptionServiceConfig) -> Self {
        Self {
            db_pool: config.db_pool,
            plan_repo: config.plan_repo,
            subscription_repo: config.subscription_repo,
            transaction_repo: config.transaction_repo,
            user_repo: config.user_repo,
            gateway: config.gateway,
        }
    }

    /// Resolve a plan by requested name, consulting the alias table once.
    async fn resolve_plan(&self, plan_name: &str) -> Result<SubscriptionPlan, SubscriptionError> {
        let canonical = canonical_plan_name(plan_name);
        if canonical != plan_name {
            tracing::debug!("Plan name aliased: requested={}, canonical={}", plan_name, canonical);
        }
        self.plan_repo
            .get_plan_by_name(canonical)
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?
            .ok_or_else(|| SubscriptionError::PlanNotFound(plan_name.to_string()))
    }

    /// Fetch a subscription and check it belongs to the caller.
    async fn get_owned_subscription(
        &self,
        user_id: &UserId,
        subscription_id: SubscriptionId,
    ) -> Result<UserSubscription, SubscriptionError> {
        let subscription = self
            .subscription_repo
            .get_subscription(subscription_id)
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?
            .ok_or(SubscriptionError::SubscriptionNotFound)?;

        // Not-found rather than forbidden: do not reveal other users' ids
        if subscription.user_id != *user_id {
            return Err(SubscriptionError::SubscriptionNotFound);
        }

        Ok(subscription)
    }
}

#[async_trait]
impl SubscriptionService for SubscriptionServiceImpl {
    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, SubscriptionError> {
        Ok(self
            .plan_repo
            .list_plans()
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?)
    }

    async fn create_checkout_order(
        &self,
        user_id: &UserId,
        plan_name: &str,
    ) -> Result<GatewayOrder, SubscriptionError> {
        tracing::info!(
            "Creating checkout order: user_id={}, plan={}",
            user_id,
            plan_name
        );

        let plan = self.resolve_plan(plan_name).await?;

        let receipt = format!("sub_{}", &user_id.as_str().chars().take(32).collect::<String>());
        let order = self
            .gateway
            .create_order(plan.price_cents, &plan.currency, &receipt)
            .await?;

        tracing::info!(
            "Checkout order created: user_id={}, order_id={}, plan={}",
            user_id,
            order.id,
            plan.name
        );

        Ok(order)
    }

    async fn record_payment_success(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<PaymentOutcome, SubscriptionError> {
        tracing::info!(
            "Processing payment confirmation: user_id={}, gateway_payment_id={}",
            confirmation.user_id,
            confirmation.gateway_payment_id
        );

        // 1. Signature check before anything touches storage or the gateway
        if !self.gateway.verify_payment_signature(
            &confirmation.gateway_order_id,
            &confirmation.gateway_payment_id,
            &confirmation.signature,
        ) {
            tracing::warn!(
                "Payment signature verification failed: user_id={}, gateway_payment_id={}",
                confirmation.user_id,
                confirmation.gateway_payment_id
            );
            return Err(SubscriptionError::InvalidSignature);
        }

        // 2. The gateway's own record must confirm capture/authorization
        let payment = self
            .gateway
            .fetch_payment(&confirmation.gateway_payment_id)
            .await?;
        if !payment.is_settled() {
            return Err(SubscriptionError::PaymentNotSettled(payment.status));
        }

        // 3. Resolve the plan (alias table consulted here, once)
        let plan = self.resolve_plan(&confirmation.plan_name).await?;

        if payment.amount_cents != plan.price_cents {
            // Amounts can legitimately differ for display-converted currencies
            tracing::warn!(
                "Payment amount differs from plan price: gateway={}, plan={}, plan_name={}",
                payment.amount_cents,
                plan.price_cents,
                plan.name
            );
        }

        // 4. Primary mutation, atomically: transaction row (idempotency
        //    anchor), deactivation of prior active rows, new subscription.
        let mut db_client = self
            .db_pool
            .get()
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?;
        let txn = db_client
            .transaction()
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?;

        let store_result = self
            .transaction_repo
            .store_transaction(
                &txn,
                NewTransaction {
                    user_id: confirmation.user_id.clone(),
                    plan_id: plan.id,
                    gateway_payment_id: confirmation.gateway_payment_id.clone(),
                    gateway_order_id: confirmation.gateway_order_id.clone(),
                    amount_cents: payment.amount_cents,
                    currency: payment.currency.clone(),
                    status: payment.status.clone(),
                    payment_date: Utc::now(),
                },
            )
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?;

        if !store_result.is_new {
            // Duplicate confirmation: report success, write nothing further
            txn.commit()
                .await
                .map_err(|e| SubscriptionError::Database(e.to_string()))?;

            tracing::info!(
                "Duplicate payment confirmation short-circuited: user_id={}, gateway_payment_id={}",
                confirmation.user_id,
                confirmation.gateway_payment_id
            );

            let existing = self
                .subscription_repo
                .get_active_subscription(&confirmation.user_id)
                .await
                .map_err(|e| SubscriptionError::Database(e.to_string()))?;

            return Ok(PaymentOutcome {
                subscription: existing,
                transaction: store_result.transaction,
                already_processed: true,
            });
        }

        let deactivated = self
            .subscription_repo
            .deactivate_active_subscriptions(&txn, &confirmation.user_id)
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?;
        if deactivated > 0 {
            tracing::info!(
                "Deactivated {} prior active subscription(s): user_id={}",
                deactivated,
                confirmation.user_id
            );
        }

        let start_date = confirmation.start_date.unwrap_or_else(Utc::now);
        let end_date = confirmation
            .end_date
            .unwrap_or(start_date + Duration::days(BILLING_CYCLE_DAYS));

        let subscription = self
            .subscription_repo
            .insert_subscription(
                &txn,
                NewSubscription {
                    user_id: confirmation.user_id.clone(),
                    plan_id: plan.id,
                    start_date,
                    end_date,
                    monthly_quota: plan.monthly_quota,
                },
            )
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?;

        tracing::info!(
            "Subscription created: user_id={}, subscription_id={}, plan={}, end_date={}",
            confirmation.user_id,
            subscription.id,
            plan.name,
            subscription.end_date
        );

        // 5. Secondary bookkeeping: make sure a cached user row exists for
        //    receipts. Best-effort; the subscription is already committed.
        if let Err(e) = self
            .user_repo
            .upsert_user(&confirmation.user_id, None, None)
            .await
        {
            tracing::warn!(
                "Failed to refresh cached user profile after payment (ignored): user_id={}, error={}",
                confirmation.user_id,
                e
            );
        }

        Ok(PaymentOutcome {
            subscription: Some(subscription),
            transaction: store_result.transaction,
            already_processed: false,
        })
    }

    async fn cancel_subscription(
        &self,
        user_id: &UserId,
        subscription_id: SubscriptionId,
    ) -> Result<UserSubscription, SubscriptionError> {
        tracing::info!(
            "Cancelling subscription: user_id={}, subscription_id={}",
            user_id,
            subscription_id
        );

        let subscription = self.get_owned_subscription(user_id, subscription_id).await?;
        if subscription.status == SubscriptionStatus::Cancelled {
            return Err(SubscriptionError::AlreadyCancelled);
        }

        let updated = self
            .subscription_repo
            .mark_cancelled(subscription_id)
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?;

        tracing::info!(
            "Subscription cancelled: user_id={}, subscription_id={}",
            user_id,
            subscription_id
        );
        Ok(updated)
    }

    async fn pause_subscription(
        &self,
        user_id: &UserId,
        subscription_id: SubscriptionId,
    ) -> Result<UserSubscription, SubscriptionError> {
        tracing::info!(
            "Pausing subscription: user_id={}, subscription_id={}",
            user_id,
            subscription_id
        );

        let subscription = self.get_owned_subscription(user_id, subscription_id).await?;
        if subscription.status != SubscriptionStatus::Active {
            return Err(SubscriptionError::NotActive);
        }

        Ok(self
            .subscription_repo
            .mark_paused(subscription_id)
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?)
    }

    async fn resume_subscription(
        &self,
        user_id: &UserId,
        subscription_id: SubscriptionId,
    ) -> Result<UserSubscription, SubscriptionError> {
        tracing::info!(
            "Resuming subscription: user_id={}, subscription_id={}",
            user_id,
            subscription_id
        );

        let subscription = self.get_owned_subscription(user_id, subscription_id).await?;
        if subscription.status != SubscriptionStatus::Paused {
            return Err(SubscriptionError::NotPaused);
        }

        Ok(self
            .subscription_repo
            .mark_resumed(subscription_id)
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?)
    }

    async fn reactivate_subscription(
        &self,
        user_id: &UserId,
        subscription_id: SubscriptionId,
    ) -> Result<UserSubscription, SubscriptionError> {
        tracing::info!(
            "Reactivating subscription: user_id={}, subscription_id={}",
            user_id,
            subscription_id
        );

        let subscription = self.get_owned_subscription(user_id, subscription_id).await?;
        if subscription.status != SubscriptionStatus::Cancelled {
            return Err(SubscriptionError::NotCancelled);
        }

        let end_date = Utc::now() + Duration::days(BILLING_CYCLE_DAYS);
        let updated = self
            .subscription_repo
            .reactivate(subscription_id, end_date)
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?;

        tracing::info!(
            "Subscription reactivated: user_id={}, subscription_id={}, end_date={}",
            user_id,
            subscription_id,
            updated.end_date
        );
        Ok(updated)
    }

    async fn change_plan(
        &self,
        user_id: &UserId,
        subscription_id: SubscriptionId,
        new_plan_id: PlanId,
    ) -> Result<UserSubscription, SubscriptionError> {
        tracing::info!(
            "Changing plan: user_id={}, subscription_id={}, new_plan_id={}",
            user_id,
            subscription_id,
            new_plan_id
        );

        let subscription = self.get_owned_subscription(user_id, subscription_id).await?;
        if subscription.status != SubscriptionStatus::Active {
            return Err(SubscriptionError::NotActive);
        }

        let plan = self
            .plan_repo
            .get_plan(new_plan_id)
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?
            .ok_or_else(|| SubscriptionError::PlanNotFound(new_plan_id.to_string()))?;

        if subscription.plan_id == plan.id {
            tracing::info!(
                "Already on target plan: user_id={}, plan={}",
                user_id,
                plan.name
            );
            return Ok(subscription);
        }

        // Quota consumed under the old plan carries over unprorated
        let updated = self
            .subscription_repo
            .change_plan(subscription_id, plan.id, plan.monthly_quota)
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?;

        tracing::info!(
            "Plan changed: user_id={}, subscription_id={}, plan={}",
            user_id,
            subscription_id,
            plan.name
        );
        Ok(updated)
    }

    async fn subscription_status(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionWithPlan>, SubscriptionError> {
        let subscription = match self
            .subscription_repo
            .get_active_subscription(user_id)
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        let plan_name = self
            .plan_repo
            .get_plan(subscription.plan_id)
            .await
            .map_err(|e| SubscriptionError::Database(e.to_string()))?
            .map(|p| p.name)
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Some(SubscriptionWithPlan {
            subscription,
            plan_name,
        }))
    }
}
