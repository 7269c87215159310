//! Subscription lifecycle tests. Run with: `cargo test -p api --test lifecycle_tests`
//! Requires a Postgres instance configured via DATABASE_* env vars.

mod common;

use common::{create_test_context, insert_active_subscription, plan_id_by_name, unique_user};
use serde_json::json;

#[tokio::test]
async fn test_cancel_then_cancel_again_is_conflict() {
    let ctx = create_test_context().await;
    let user_id = unique_user("lc_cancel");
    let subscription_id = insert_active_subscription(&ctx.db, &user_id, "Starter", 0, 20, 0).await;

    let request = json!({
        "userId": user_id,
        "subscriptionId": subscription_id.to_string()
    });

    let first = ctx.server.post("/cancel-subscription").json(&request).await;
    assert_eq!(first.status_code(), 200);
    let body: serde_json::Value = first.json();
    assert_eq!(body["subscription"]["status"], "cancelled");
    assert!(body["subscription"]["cancelledAt"].is_string());

    // Cancelling again is a conflict, not a silent success
    let second = ctx.server.post("/cancel-subscription").json(&request).await;
    assert_eq!(second.status_code(), 409);
}

#[tokio::test]
async fn test_cancel_unknown_subscription_is_not_found() {
    let ctx = create_test_context().await;

    let response = ctx
        .server
        .post("/cancel-subscription")
        .json(&json!({
            "userId": unique_user("lc_unknown"),
            "subscriptionId": uuid::Uuid::new_v4().to_string()
        }))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_cancel_other_users_subscription_is_not_found() {
    let ctx = create_test_context().await;
    let owner = unique_user("lc_owner");
    let subscription_id = insert_active_subscription(&ctx.db, &owner, "Starter", 0, 20, 0).await;

    let response = ctx
        .server
        .post("/cancel-subscription")
        .json(&json!({
            "userId": unique_user("lc_intruder"),
            "subscriptionId": subscription_id.to_string()
        }))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_malformed_subscription_id_rejected() {
    let ctx = create_test_context().await;

    let response = ctx
        .server
        .post("/cancel-subscription")
        .json(&json!({
            "userId": unique_user("lc_badid"),
            "subscriptionId": "not-a-uuid"
        }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_pause_and_resume_roundtrip() {
    let ctx = create_test_context().await;
    let user_id = unique_user("lc_pause");
    let subscription_id = insert_active_subscription(&ctx.db, &user_id, "Starter", 0, 20, 0).await;

    let request = json!({
        "userId": user_id,
        "subscriptionId": subscription_id.to_string()
    });

    let paused = ctx.server.post("/pause-subscription").json(&request).await;
    assert_eq!(paused.status_code(), 200);
    let body: serde_json::Value = paused.json();
    assert_eq!(body["subscription"]["status"], "paused");
    assert!(body["subscription"]["pausedAt"].is_string());

    // Pausing a paused subscription is a validation error
    let paused_again = ctx.server.post("/pause-subscription").json(&request).await;
    assert_eq!(paused_again.status_code(), 400);

    let resumed = ctx.server.post("/resume-subscription").json(&request).await;
    assert_eq!(resumed.status_code(), 200);
    let body: serde_json::Value = resumed.json();
    assert_eq!(body["subscription"]["status"], "active");

    // Resuming an active subscription is a validation error
    let resumed_again = ctx.server.post("/resume-subscription").json(&request).await;
    assert_eq!(resumed_again.status_code(), 400);
}

#[tokio::test]
async fn test_reactivate_non_cancelled_is_validation_error() {
    let ctx = create_test_context().await;
    let user_id = unique_user("lc_react_bad");
    let subscription_id = insert_active_subscription(&ctx.db, &user_id, "Starter", 0, 20, 0).await;

    let response = ctx
        .server
        .post("/reactivate-subscription")
        .json(&json!({
            "userId": user_id,
            "subscriptionId": subscription_id.to_string()
        }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_reactivate_cancelled_restarts_billing_window() {
    let ctx = create_test_context().await;
    let user_id = unique_user("lc_react");
    let subscription_id = insert_active_subscription(&ctx.db, &user_id, "Starter", 13, 20, 10).await;

    let request = json!({
        "userId": user_id,
        "subscriptionId": subscription_id.to_string()
    });

    let cancelled = ctx.server.post("/cancel-subscription").json(&request).await;
    assert_eq!(cancelled.status_code(), 200);

    let reactivated = ctx
        .server
        .post("/reactivate-subscription")
        .json(&request)
        .await;
    assert_eq!(reactivated.status_code(), 200);
    let body: serde_json::Value = reactivated.json();
    assert_eq!(body["subscription"]["status"], "active");
    // Fresh window: consumed quota restarts and lifecycle marks clear
    assert_eq!(body["subscription"]["quotaUsed"], 0);
    assert!(body["subscription"].get("cancelledAt").is_none());
}

#[tokio::test]
async fn test_update_subscription_swaps_plan_without_proration() {
    let ctx = create_test_context().await;
    let user_id = unique_user("lc_update");
    let subscription_id = insert_active_subscription(&ctx.db, &user_id, "Starter", 7, 20, 0).await;
    let ultimate_id = plan_id_by_name(&ctx.db, "Ultimate").await;

    let response = ctx
        .server
        .post("/update-subscription")
        .json(&json!({
            "userId": user_id,
            "subscriptionId": subscription_id.to_string(),
            "newPlanId": ultimate_id.to_string()
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["subscription"]["planId"], json!(ultimate_id));
    assert_eq!(body["subscription"]["monthlyQuota"], 500);
    // Consumed quota carries over unprorated
    assert_eq!(body["subscription"]["quotaUsed"], 7);
}

#[tokio::test]
async fn test_update_subscription_unknown_plan_is_not_found() {
    let ctx = create_test_context().await;
    let user_id = unique_user("lc_update_noplan");
    let subscription_id = insert_active_subscription(&ctx.db, &user_id, "Starter", 0, 20, 0).await;

    let response = ctx
        .server
        .post("/update-subscription")
        .json(&json!({
            "userId": user_id,
            "subscriptionId": subscription_id.to_string(),
            "newPlanId": uuid::Uuid::new_v4().to_string()
        }))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_subscription_status_reflects_active_subscription() {
    let ctx = create_test_context().await;
    let user_id = unique_user("lc_status");

    let before = ctx
        .server
        .get("/subscription-status")
        .add_query_param("userId", &user_id)
        .await;
    assert_eq!(before.status_code(), 200);
    let body: serde_json::Value = before.json();
    assert_eq!(body["hasActiveSubscription"], false);

    insert_active_subscription(&ctx.db, &user_id, "Pro", 2, 100, 0).await;

    let after = ctx
        .server
        .get("/subscription-status")
        .add_query_param("userId", &user_id)
        .await;
    assert_eq!(after.status_code(), 200);
    let body: serde_json::Value = after.json();
    assert_eq!(body["hasActiveSubscription"], true);
    assert_eq!(body["subscription"]["planName"], "Pro");
    assert_eq!(body["subscription"]["quotaUsed"], 2);
}

#[tokio::test]
async fn test_list_plans_returns_seeded_plans() {
    let ctx = create_test_context().await;

    let response = ctx.server.get("/plans").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    let plans = body["plans"].as_array().expect("plans array");
    assert!(plans.len() >= 3);

    let names: Vec<&str> = plans
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert!(names.contains(&"Starter"));
    assert!(names.contains(&"Pro"));
    assert!(names.contains(&"Ultimate"));

    // Sorted by price ascending
    let prices: Vec<i64> = plans
        .iter()
        .filter_map(|p| p["priceCents"].as_i64())
        .collect();
    let mut sorted = prices.clone();
    sorted.sort();
    assert_eq!(prices, sorted);
}

#[tokio::test]
async fn test_health_check() {
    let ctx = create_test_context().await;
    let response = ctx.server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}
