//! Feature gate integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

#[tokio::test]
async fn features_are_listed() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/features").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let features = body["features"].as_array().unwrap();
    let homework = features
        .iter()
        .find(|f| f["key"] == "homework")
        .expect("homework is built in");
    assert_eq!(homework["cost"], 10);
}

#[tokio::test]
async fn check_does_not_create_accounts() {
    let harness = TestHarness::new();

    let response = harness
        .post_service(
            "/v1/features/check",
            json!({
                "userId": harness.test_user_id.to_string(),
                "featureKey": "teacher_mode"
            }),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["canAfford"], false);
    assert_eq!(body["cost"], 25);
    assert_eq!(body["shortfall"], 25);

    // Nobody has an account yet, so the leaderboard is still empty.
    let board: serde_json::Value = harness.server.get("/v1/leaderboard").await.json();
    assert!(board["leaderboard"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn use_feature_debits_cost() {
    let harness = TestHarness::new();
    harness.credit(15).await;

    let response = harness
        .post_service(
            "/v1/features/use",
            json!({
                "userId": harness.test_user_id.to_string(),
                "featureKey": "homework"
            }),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["granted"], true);
    assert_eq!(body["balance"], 5);
    assert_eq!(body["previousBalance"], 15);
    assert_eq!(body["deducted"], 10);
}

#[tokio::test]
async fn use_feature_without_funds_is_refused() {
    let harness = TestHarness::new();
    harness.credit(5).await;

    let response = harness
        .post_service(
            "/v1/features/use",
            json!({
                "userId": harness.test_user_id.to_string(),
                "featureKey": "homework"
            }),
        )
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "INSUFFICIENT_BALANCE");
    assert_eq!(body["shortfall"], 5);
    assert!(body.get("granted").is_none());

    assert_eq!(harness.balance().await["balance"], 5);
}

#[tokio::test]
async fn unknown_feature_is_not_found() {
    let harness = TestHarness::new();
    harness.credit(100).await;

    let response = harness
        .post_service(
            "/v1/features/use",
            json!({
                "userId": harness.test_user_id.to_string(),
                "featureKey": "time_machine"
            }),
        )
        .await;

    response.assert_status_not_found();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "UNKNOWN_FEATURE");
    assert_eq!(body["featureKey"], "time_machine");
    assert_eq!(harness.balance().await["balance"], 100);
}

#[tokio::test]
async fn use_feature_honours_idempotency_key() {
    let harness = TestHarness::new();
    harness.credit(100).await;
    let request = json!({
        "userId": harness.test_user_id.to_string(),
        "featureKey": "essay_review",
        "idempotencyKey": "essay-42"
    });

    harness
        .post_service("/v1/features/use", request.clone())
        .await
        .assert_status_ok();
    harness
        .post_service("/v1/features/use", request)
        .await
        .assert_status(StatusCode::CONFLICT);

    assert_eq!(harness.balance().await["balance"], 80);
}
