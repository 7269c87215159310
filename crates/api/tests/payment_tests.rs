//! Payment confirmation tests. Run with: `cargo test -p api --test payment_tests`
//! Requires a Postgres instance configured via DATABASE_* env vars.

mod common;

use common::{
    count_subscriptions, count_transactions, create_test_context, insert_active_subscription,
    mock_captured_payment, mock_failed_payment, plan_id_by_name, sign_payment, unique_user,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn unique_payment_id() -> String {
    format!("pay_{}", uuid::Uuid::new_v4().simple())
}

fn unique_order_id() -> String {
    format!("order_{}", uuid::Uuid::new_v4().simple())
}

#[tokio::test]
async fn test_payment_success_with_bad_signature_is_unauthorized() {
    let ctx = create_test_context().await;
    let user_id = unique_user("pay_badsig");
    let payment_id = unique_payment_id();

    let response = ctx
        .server
        .post("/payment-success")
        .json(&json!({
            "userId": user_id,
            "planName": "Pro",
            "amount": 99900,
            "gatewayPaymentId": payment_id,
            "gatewayOrderId": unique_order_id(),
            "signature": "forged"
        }))
        .await;

    assert_eq!(response.status_code(), 401);
    // Nothing may be written before the signature verifies
    assert_eq!(count_transactions(&ctx.db, &payment_id).await, 0);
    assert_eq!(count_subscriptions(&ctx.db, &user_id).await, 0);
}

#[tokio::test]
async fn test_payment_success_creates_subscription_and_transaction() {
    let ctx = create_test_context().await;
    let user_id = unique_user("pay_ok");
    let payment_id = unique_payment_id();
    let order_id = unique_order_id();
    mock_captured_payment(&ctx.gateway, &payment_id, &order_id, 99900).await;

    let response = ctx
        .server
        .post("/payment-success")
        .json(&json!({
            "userId": user_id,
            "planName": "Pro",
            "amount": 99900,
            "gatewayPaymentId": payment_id,
            "gatewayOrderId": order_id,
            "signature": sign_payment(&order_id, &payment_id)
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["alreadyProcessed"], false);
    assert_eq!(body["subscription"]["status"], "active");
    assert_eq!(body["subscription"]["monthlyQuota"], 100);
    assert_eq!(body["subscription"]["quotaUsed"], 0);
    assert_eq!(body["transaction"]["gatewayPaymentId"], payment_id);

    assert_eq!(count_transactions(&ctx.db, &payment_id).await, 1);
    assert_eq!(count_subscriptions(&ctx.db, &user_id).await, 1);
}

#[tokio::test]
async fn test_duplicate_payment_success_is_idempotent() {
    let ctx = create_test_context().await;
    let user_id = unique_user("pay_dup");
    let payment_id = unique_payment_id();
    let order_id = unique_order_id();
    mock_captured_payment(&ctx.gateway, &payment_id, &order_id, 99900).await;

    let request = json!({
        "userId": user_id,
        "planName": "Pro",
        "amount": 99900,
        "gatewayPaymentId": payment_id,
        "gatewayOrderId": order_id,
        "signature": sign_payment(&order_id, &payment_id)
    });

    let first = ctx.server.post("/payment-success").json(&request).await;
    assert_eq!(first.status_code(), 200);
    let first_body: serde_json::Value = first.json();
    assert_eq!(first_body["alreadyProcessed"], false);

    let second = ctx.server.post("/payment-success").json(&request).await;
    assert_eq!(second.status_code(), 200);
    let second_body: serde_json::Value = second.json();
    assert_eq!(second_body["alreadyProcessed"], true);

    // Exactly one transaction and one subscription despite the retry
    assert_eq!(count_transactions(&ctx.db, &payment_id).await, 1);
    assert_eq!(count_subscriptions(&ctx.db, &user_id).await, 1);
}

#[tokio::test]
async fn test_payment_success_resolves_plan_alias() {
    let ctx = create_test_context().await;
    let user_id = unique_user("pay_alias");
    let payment_id = unique_payment_id();
    let order_id = unique_order_id();
    mock_captured_payment(&ctx.gateway, &payment_id, &order_id, 99900).await;

    // "Enterprise" is a historic alias for "Pro"
    let response = ctx
        .server
        .post("/payment-success")
        .json(&json!({
            "userId": user_id,
            "planName": "Enterprise",
            "amount": 99900,
            "gatewayPaymentId": payment_id,
            "gatewayOrderId": order_id,
            "signature": sign_payment(&order_id, &payment_id)
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    let pro_plan_id = plan_id_by_name(&ctx.db, "Pro").await;
    assert_eq!(
        body["subscription"]["planId"],
        serde_json::json!(pro_plan_id)
    );
}

#[tokio::test]
async fn test_payment_success_unknown_plan_is_not_found() {
    let ctx = create_test_context().await;
    let payment_id = unique_payment_id();
    let order_id = unique_order_id();
    mock_captured_payment(&ctx.gateway, &payment_id, &order_id, 99900).await;

    let response = ctx
        .server
        .post("/payment-success")
        .json(&json!({
            "userId": unique_user("pay_noplan"),
            "planName": "Nonexistent",
            "amount": 99900,
            "gatewayPaymentId": payment_id,
            "gatewayOrderId": order_id,
            "signature": sign_payment(&order_id, &payment_id)
        }))
        .await;

    assert_eq!(response.status_code(), 404);
    assert_eq!(count_transactions(&ctx.db, &payment_id).await, 0);
}

#[tokio::test]
async fn test_payment_not_captured_is_rejected() {
    let ctx = create_test_context().await;
    let user_id = unique_user("pay_failed");
    let payment_id = unique_payment_id();
    let order_id = unique_order_id();
    mock_failed_payment(&ctx.gateway, &payment_id).await;

    let response = ctx
        .server
        .post("/payment-success")
        .json(&json!({
            "userId": user_id,
            "planName": "Pro",
            "amount": 99900,
            "gatewayPaymentId": payment_id,
            "gatewayOrderId": order_id,
            "signature": sign_payment(&order_id, &payment_id)
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(count_transactions(&ctx.db, &payment_id).await, 0);
    assert_eq!(count_subscriptions(&ctx.db, &user_id).await, 0);
}

#[tokio::test]
async fn test_payment_success_deactivates_prior_subscription() {
    let ctx = create_test_context().await;
    let user_id = unique_user("pay_upgrade");
    insert_active_subscription(&ctx.db, &user_id, "Starter", 5, 20, 0).await;

    let payment_id = unique_payment_id();
    let order_id = unique_order_id();
    mock_captured_payment(&ctx.gateway, &payment_id, &order_id, 99900).await;

    let response = ctx
        .server
        .post("/payment-success")
        .json(&json!({
            "userId": user_id,
            "planName": "Pro",
            "amount": 99900,
            "gatewayPaymentId": payment_id,
            "gatewayOrderId": order_id,
            "signature": sign_payment(&order_id, &payment_id)
        }))
        .await;

    assert_eq!(response.status_code(), 200);

    // Only the new subscription remains active
    let client = ctx.db.pool().get().await.expect("pool");
    let row = client
        .query_one(
            "SELECT COUNT(*)::bigint FROM user_subscriptions
             WHERE user_id = $1 AND status = 'active'",
            &[&user_id],
        )
        .await
        .expect("count active");
    let active: i64 = row.get(0);
    assert_eq!(active, 1);
}

#[tokio::test]
async fn test_payment_success_missing_fields_rejected_before_any_write() {
    let ctx = create_test_context().await;
    let payment_id = unique_payment_id();

    let response = ctx
        .server
        .post("/payment-success")
        .json(&json!({
            "userId": unique_user("pay_missing"),
            "planName": "Pro",
            "amount": 99900,
            "gatewayPaymentId": payment_id,
            "gatewayOrderId": "",
            "signature": "sig"
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(count_transactions(&ctx.db, &payment_id).await, 0);
}

#[tokio::test]
async fn test_create_order_returns_gateway_order() {
    let ctx = create_test_context().await;

    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_new123",
            "amount": 99900,
            "currency": "INR",
            "receipt": "sub_user",
            "status": "created"
        })))
        .mount(&ctx.gateway)
        .await;

    let response = ctx
        .server
        .post("/create-order")
        .json(&json!({
            "userId": unique_user("order_ok"),
            "planName": "Pro"
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["order"]["id"], "order_new123");
    assert_eq!(body["order"]["amount_cents"], 99900);
}

#[tokio::test]
async fn test_create_order_unknown_plan_is_not_found() {
    let ctx = create_test_context().await;

    let response = ctx
        .server
        .post("/create-order")
        .json(&json!({
            "userId": unique_user("order_noplan"),
            "planName": "Mystery"
        }))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_create_order_gateway_failure_is_bad_gateway() {
    let ctx = create_test_context().await;

    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ctx.gateway)
        .await;

    let response = ctx
        .server
        .post("/create-order")
        .json(&json!({
            "userId": unique_user("order_upstream"),
            "planName": "Pro"
        }))
        .await;

    assert_eq!(response.status_code(), 502);
}
