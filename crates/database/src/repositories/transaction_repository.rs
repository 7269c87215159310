use crate::pool::DbPool;
use async_trait::async_trait;
use services::subscription::ports::{
    NewTransaction, StoreTransactionResult, SubscriptionTransaction, TransactionRepository,
};
use tokio_postgres::Row;

pub struct PostgresTransactionRepository {
    pool: DbPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const TRANSACTION_COLUMNS: &str = "id, user_id, plan_id, gateway_payment_id, gateway_order_id, \
     amount_cents, currency, status, payment_date";

fn transaction_from_row(row: &Row) -> SubscriptionTransaction {
    SubscriptionTransaction {
        id: row.get("id"),
        user_id: row.get("user_id"),
        plan_id: row.get("plan_id"),
        gateway_payment_id: row.get("gateway_payment_id"),
        gateway_order_id: row.get("gateway_order_id"),
        amount_cents: row.get("amount_cents"),
        currency: row.get("currency"),
        status: row.get("status"),
        payment_date: row.get("payment_date"),
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn store_transaction(
        &self,
        txn: &tokio_postgres::Transaction<'_>,
        transaction: NewTransaction,
    ) -> anyhow::Result<StoreTransactionResult> {
        tracing::info!(
            "Repository: Storing payment transaction - user_id={}, gateway_payment_id={}",
            transaction.user_id,
            transaction.gateway_payment_id
        );

        // Idempotent due to the UNIQUE(gateway_payment_id) constraint
        let result = txn
            .query_opt(
                &format!(
                    "INSERT INTO subscription_transactions (
                        user_id, plan_id, gateway_payment_id, gateway_order_id,
                        amount_cents, currency, status, payment_date
                     )
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                     ON CONFLICT (gateway_payment_id) DO NOTHING
                     RETURNING {}",
                    TRANSACTION_COLUMNS
                ),
                &[
                    &transaction.user_id,
                    &transaction.plan_id,
                    &transaction.gateway_payment_id,
                    &transaction.gateway_order_id,
                    &transaction.amount_cents,
                    &transaction.currency,
                    &transaction.status,
                    &transaction.payment_date,
                ],
            )
            .await?;

        if let Some(row) = result {
            return Ok(StoreTransactionResult {
                transaction: transaction_from_row(&row),
                is_new: true,
            });
        }

        // Transaction already exists, fetch it
        tracing::debug!(
            "Repository: Transaction already exists, fetching - gateway_payment_id={}",
            transaction.gateway_payment_id
        );

        let row = txn
            .query_one(
                &format!(
                    "SELECT {} FROM subscription_transactions WHERE gateway_payment_id = $1",
                    TRANSACTION_COLUMNS
                ),
                &[&transaction.gateway_payment_id],
            )
            .await?;

        Ok(StoreTransactionResult {
            transaction: transaction_from_row(&row),
            is_new: false,
        })
    }

    async fn get_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> anyhow::Result<Option<SubscriptionTransaction>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                &format!(
                    "SELECT {} FROM subscription_transactions WHERE gateway_payment_id = $1",
                    TRANSACTION_COLUMNS
                ),
                &[&gateway_payment_id],
            )
            .await?;

        Ok(row.as_ref().map(transaction_from_row))
    }
}
