#![allow(dead_code)]

use api::{create_router, AppState};
use axum_test::TestServer;
use serde_json::json;
use services::payments::RazorpayClient;
use services::quota::QuotaServiceImpl;
use services::subscription::{SubscriptionServiceConfig, SubscriptionServiceImpl};
use services::trial::TrialServiceImpl;
use services::user::UserServiceImpl;
use services::geo::{GeoServiceImpl, HttpGeoLocator};
use std::sync::Arc;
use tokio::sync::OnceCell;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Gateway key secret used to sign test payment confirmations
pub const TEST_GATEWAY_SECRET: &str = "rzp_test_secret";

// Global once cell to ensure migrations only run once across all tests
static MIGRATIONS_INITIALIZED: OnceCell<()> = OnceCell::const_new();

/// A test server plus the mock collaborators and database handle behind it.
/// Keep the MockServers alive for as long as requests are made.
pub struct TestContext {
    pub server: TestServer,
    pub gateway: MockServer,
    pub geo: MockServer,
    pub db: database::Database,
}

/// Create a test server with all services wired to mock collaborators
pub async fn create_test_context() -> TestContext {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::from_env();

    // Create database connection
    let db = database::Database::from_config(&config.database)
        .await
        .expect("Failed to connect to database");

    // Run migrations only once, even when tests run in parallel
    MIGRATIONS_INITIALIZED
        .get_or_init(|| async {
            db.run_migrations()
                .await
                .expect("Failed to run database migrations");
        })
        .await;

    // External collaborators are mocked
    let gateway_mock = MockServer::start().await;
    let geo_mock = MockServer::start().await;

    let gateway = Arc::new(RazorpayClient::new(
        "rzp_test_key".to_string(),
        TEST_GATEWAY_SECRET.to_string(),
        gateway_mock.uri(),
    ));

    let trial_service = Arc::new(TrialServiceImpl::new(db.trial_repository()));
    let quota_service = Arc::new(QuotaServiceImpl::new(db.quota_ledger_repository()));
    let user_service = Arc::new(UserServiceImpl::new(db.user_repository()));
    let subscription_service = Arc::new(SubscriptionServiceImpl::new(SubscriptionServiceConfig {
        db_pool: db.pool().clone(),
        plan_repo: db.plan_repository(),
        subscription_repo: db.subscription_repository(),
        transaction_repo: db.transaction_repository(),
        user_repo: db.user_repository(),
        gateway,
    }));
    let geo_locator = Arc::new(HttpGeoLocator::new(geo_mock.uri(), 3));
    let geo_service = Arc::new(GeoServiceImpl::new(geo_locator, 83.0));

    let app_state = AppState {
        trial_service,
        quota_service,
        subscription_service,
        user_service,
        geo_service,
    };

    let app = create_router(app_state);
    let server = TestServer::new(app).expect("Failed to create test server");

    TestContext {
        server,
        gateway: gateway_mock,
        geo: geo_mock,
        db,
    }
}

/// A fresh opaque user id so tests never collide on ledger rows
pub fn unique_user(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Sign an order/payment pair the way the gateway does
pub fn sign_payment(order_id: &str, payment_id: &str) -> String {
    RazorpayClient::payment_signature(TEST_GATEWAY_SECRET, order_id, payment_id)
}

/// Mock the gateway payment-status lookup to report a captured payment
pub async fn mock_captured_payment(
    gateway: &MockServer,
    payment_id: &str,
    order_id: &str,
    amount_cents: i64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/payments/{}", payment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": payment_id,
            "order_id": order_id,
            "amount": amount_cents,
            "currency": "INR",
            "status": "captured",
            "method": "upi"
        })))
        .mount(gateway)
        .await;
}

/// Mock the gateway lookup to report a payment that was never captured
pub async fn mock_failed_payment(gateway: &MockServer, payment_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/payments/{}", payment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": payment_id,
            "order_id": null,
            "amount": 0,
            "currency": "INR",
            "status": "failed",
            "method": null
        })))
        .mount(gateway)
        .await;
}

/// Look up a seeded plan id by name
pub async fn plan_id_by_name(db: &database::Database, name: &str) -> Uuid {
    let client = db.pool().get().await.expect("pool");
    let row = client
        .query_one(
            "SELECT id FROM subscription_plans WHERE name = $1",
            &[&name],
        )
        .await
        .expect("plan should be seeded");
    row.get(0)
}

/// Insert an active subscription directly, bypassing the payment flow.
/// `last_reset_days_ago` backdates the quota window for rollover tests.
pub async fn insert_active_subscription(
    db: &database::Database,
    user_id: &str,
    plan_name: &str,
    quota_used: i32,
    monthly_quota: i32,
    last_reset_days_ago: i32,
) -> Uuid {
    let plan_id = plan_id_by_name(db, plan_name).await;
    let client = db.pool().get().await.expect("pool");
    let row = client
        .query_one(
            "INSERT INTO user_subscriptions (
                user_id, plan_id, status, start_date, end_date,
                quota_used, monthly_quota, last_quota_reset
             )
             VALUES ($1, $2, 'active', NOW(), NOW() + INTERVAL '30 days',
                     $3, $4, NOW() - make_interval(days => $5))
             RETURNING id",
            &[&user_id, &plan_id, &quota_used, &monthly_quota, &last_reset_days_ago],
        )
        .await
        .expect("insert subscription");
    row.get(0)
}

/// Stored trial counter for a user, if the row exists
pub async fn stored_trial_usage(db: &database::Database, user_id: &str) -> Option<i32> {
    let client = db.pool().get().await.expect("pool");
    client
        .query_opt(
            "SELECT analyses_used FROM user_trials WHERE user_id = $1",
            &[&user_id],
        )
        .await
        .expect("query trial")
        .map(|r| r.get(0))
}

/// Force a trial counter to an arbitrary value (simulates external drift)
pub async fn set_stored_trial_usage(db: &database::Database, user_id: &str, analyses_used: i32) {
    let client = db.pool().get().await.expect("pool");
    client
        .execute(
            "INSERT INTO user_trials (user_id, analyses_used)
             VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET analyses_used = EXCLUDED.analyses_used",
            &[&user_id, &analyses_used],
        )
        .await
        .expect("set trial usage");
}

/// Number of transaction rows recorded for a gateway payment id
pub async fn count_transactions(db: &database::Database, gateway_payment_id: &str) -> i64 {
    let client = db.pool().get().await.expect("pool");
    let row = client
        .query_one(
            "SELECT COUNT(*)::bigint FROM subscription_transactions WHERE gateway_payment_id = $1",
            &[&gateway_payment_id],
        )
        .await
        .expect("count transactions");
    row.get(0)
}

/// Number of subscription rows for a user
pub async fn count_subscriptions(db: &database::Database, user_id: &str) -> i64 {
    let client = db.pool().get().await.expect("pool");
    let row = client
        .query_one(
            "SELECT COUNT(*)::bigint FROM user_subscriptions WHERE user_id = $1",
            &[&user_id],
        )
        .await
        .expect("count subscriptions");
    row.get(0)
}

/// Stored quota counters for a subscription
pub async fn stored_quota(db: &database::Database, subscription_id: Uuid) -> (i32, i32) {
    let client = db.pool().get().await.expect("pool");
    let row = client
        .query_one(
            "SELECT quota_used, monthly_quota FROM user_subscriptions WHERE id = $1",
            &[&subscription_id],
        )
        .await
        .expect("query subscription");
    (row.get(0), row.get(1))
}
