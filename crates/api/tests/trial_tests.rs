//! Free-trial ledger tests. Run with: `cargo test -p api --test trial_tests`
//! Requires a Postgres instance configured via DATABASE_* env vars.

mod common;

use common::{create_test_context, set_stored_trial_usage, stored_trial_usage, unique_user};
use serde_json::json;

#[tokio::test]
async fn test_check_free_trial_fresh_user() {
    let ctx = create_test_context().await;
    let user_id = unique_user("trial_fresh");

    let response = ctx
        .server
        .post("/check-free-trial")
        .json(&json!({ "userId": user_id }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["analysesUsed"], 0);
    assert_eq!(body["analysesLimit"], 2);
    assert_eq!(body["analysesRemaining"], 2);
    assert_eq!(body["isOnFreeTrial"], true);
    assert_eq!(body["trialEnded"], false);

    // The record was created lazily
    assert_eq!(stored_trial_usage(&ctx.db, &user_id).await, Some(0));
}

#[tokio::test]
async fn test_check_free_trial_empty_user_id_rejected() {
    let ctx = create_test_context().await;

    let response = ctx
        .server
        .post("/check-free-trial")
        .json(&json!({ "userId": "  " }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_check_free_trial_is_idempotent() {
    let ctx = create_test_context().await;
    let user_id = unique_user("trial_idem");

    for _ in 0..3 {
        let response = ctx
            .server
            .post("/check-free-trial")
            .json(&json!({ "userId": user_id }))
            .await;
        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        assert_eq!(body["analysesUsed"], 0);
    }
}

#[tokio::test]
async fn test_two_increments_then_third_is_capped() {
    let ctx = create_test_context().await;
    let user_id = unique_user("trial_cap");

    let first: serde_json::Value = ctx
        .server
        .post("/update-free-trial")
        .json(&json!({ "userId": user_id }))
        .await
        .json();
    assert_eq!(first["analysesUsed"], 1);
    assert_eq!(first["analysesRemaining"], 1);
    assert_eq!(first["trialEnded"], false);

    let second: serde_json::Value = ctx
        .server
        .post("/update-free-trial")
        .json(&json!({ "userId": user_id }))
        .await
        .json();
    assert_eq!(second["analysesUsed"], 2);
    assert_eq!(second["analysesRemaining"], 0);
    assert_eq!(second["trialEnded"], true);

    // Third call must not move the stored counter
    let third = ctx
        .server
        .post("/update-free-trial")
        .json(&json!({ "userId": user_id }))
        .await;
    assert_eq!(third.status_code(), 200);
    let body: serde_json::Value = third.json();
    assert_eq!(body["analysesUsed"], 2);
    assert_eq!(body["analysesRemaining"], 0);
    assert_eq!(body["trialEnded"], true);
    assert_eq!(body["isOnFreeTrial"], false);

    assert_eq!(stored_trial_usage(&ctx.db, &user_id).await, Some(2));
}

#[tokio::test]
async fn test_drifted_counter_is_repaired_on_check() {
    let ctx = create_test_context().await;
    let user_id = unique_user("trial_drift");

    // Simulate drift from an external bug
    set_stored_trial_usage(&ctx.db, &user_id, 7).await;

    let response = ctx
        .server
        .post("/check-free-trial")
        .json(&json!({ "userId": user_id }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["analysesUsed"], 2);
    assert_eq!(body["analysesRemaining"], 0);
    assert_eq!(body["trialEnded"], true);

    // Stored value corrected down to the limit
    assert_eq!(stored_trial_usage(&ctx.db, &user_id).await, Some(2));
}

#[tokio::test]
async fn test_concurrent_increments_never_exceed_limit() {
    let ctx = create_test_context().await;
    let user_id = unique_user("trial_race");

    let responses = futures::future::join_all((0..6).map(|_| {
        let server = &ctx.server;
        let user_id = &user_id;
        async move {
            server
                .post("/update-free-trial")
                .json(&json!({ "userId": user_id }))
                .await
        }
    }))
    .await;

    for response in &responses {
        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        assert!(body["analysesUsed"].as_i64().unwrap() <= 2);
    }

    // The conditional update guarantees the stored counter stops at the limit
    assert_eq!(stored_trial_usage(&ctx.db, &user_id).await, Some(2));
}
