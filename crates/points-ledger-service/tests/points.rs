//! Balance, credit, debit and history integration tests.

mod common;

use std::future::IntoFuture;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

// ============================================================================
// Balance
// ============================================================================

#[tokio::test]
async fn new_user_starts_at_level_one() {
    let harness = TestHarness::new();

    let body = harness.balance().await;

    assert_eq!(body["balance"], 0);
    assert_eq!(body["xp"], 0);
    assert_eq!(body["level"], 1);
    assert_eq!(body["credits"], 0);
    assert!(body["created_at"].is_string());
    assert!(body["updated_at"].is_string());
}

#[tokio::test]
async fn balance_reads_are_stable() {
    let harness = TestHarness::new();
    harness.credit(30).await;

    assert_eq!(harness.balance().await, harness.balance().await);
}

#[tokio::test]
async fn balance_without_api_key_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/points/balance")
        .json(&json!({ "userId": harness.test_user_id.to_string() }))
        .await;

    response.assert_status_unauthorized();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn balance_with_wrong_api_key_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/points/balance")
        .add_header("x-api-key", "not-the-key")
        .json(&json!({ "userId": harness.test_user_id.to_string() }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn balance_with_invalid_user_id_fails() {
    let harness = TestHarness::new();

    let response = harness
        .post_service("/v1/points/balance", json!({ "userId": "not-a-uuid" }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "INVALID_USER_ID");
}

// ============================================================================
// Credit
// ============================================================================

#[tokio::test]
async fn credit_raises_balance_and_xp() {
    let harness = TestHarness::new();

    let response = harness
        .post_service(
            "/v1/points/credit",
            json!({
                "userId": harness.test_user_id.to_string(),
                "amount": 15,
                "reason": "quiz",
                "transactionType": "quiz"
            }),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["balance"], 15);
    assert_eq!(body["xp"], 15);
    assert_eq!(body["level"], 1);
    assert_eq!(body["previousBalance"], 0);
    assert!(body["transactionId"].is_string());
}

#[tokio::test]
async fn repeated_credits_reach_level_two() {
    let harness = TestHarness::new();
    harness.credit(15).await;

    let mut last = serde_json::Value::Null;
    for _ in 0..9 {
        last = harness.credit(10).await;
    }

    assert_eq!(last["xp"], 105);
    assert_eq!(last["level"], 2);
}

#[tokio::test]
async fn credit_rejects_non_positive_amount() {
    let harness = TestHarness::new();

    for amount in [0, -5] {
        let response = harness
            .post_service(
                "/v1/points/credit",
                json!({
                    "userId": harness.test_user_id.to_string(),
                    "amount": amount,
                    "reason": "quiz",
                    "transactionType": "quiz"
                }),
            )
            .await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "INVALID_AMOUNT");
    }

    assert_eq!(harness.balance().await["balance"], 0);
}

#[tokio::test]
async fn credit_requires_reason() {
    let harness = TestHarness::new();

    let response = harness
        .post_service(
            "/v1/points/credit",
            json!({
                "userId": harness.test_user_id.to_string(),
                "amount": 10,
                "transactionType": "quiz"
            }),
        )
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "MISSING_FIELD");
    assert_eq!(body["field"], "reason");
}

#[tokio::test]
async fn credit_rejects_reserved_metadata() {
    let harness = TestHarness::new();

    for metadata in [json!({ "conversion": true }), json!({ "featureKey": "homework" })] {
        let response = harness
            .post_service(
                "/v1/points/credit",
                json!({
                    "userId": harness.test_user_id.to_string(),
                    "amount": 10,
                    "reason": "quiz",
                    "transactionType": "quiz",
                    "metadata": metadata
                }),
            )
            .await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "INVALID_METADATA");
    }

    assert_eq!(harness.balance().await["balance"], 0);
}

#[tokio::test]
async fn replayed_idempotency_key_is_rejected() {
    let harness = TestHarness::new();
    let request = json!({
        "userId": harness.test_user_id.to_string(),
        "amount": 5,
        "reason": "Daily login",
        "transactionType": "login",
        "idempotencyKey": "login-2026-10-19"
    });

    harness
        .post_service("/v1/points/credit", request.clone())
        .await
        .assert_status_ok();

    let response = harness.post_service("/v1/points/credit", request).await;
    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "DUPLICATE_EVENT");

    assert_eq!(harness.balance().await["balance"], 5);
}

// ============================================================================
// Debit
// ============================================================================

#[tokio::test]
async fn debit_spends_without_touching_xp() {
    let harness = TestHarness::new();
    harness.credit(15).await;

    let response = harness
        .post_service(
            "/v1/points/debit",
            json!({
                "userId": harness.test_user_id.to_string(),
                "amount": 10,
                "reason": "Homework Helper",
                "featureKey": "homework"
            }),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 5);
    assert_eq!(body["previousBalance"], 15);
    assert_eq!(body["deducted"], 10);

    let balance = harness.balance().await;
    assert_eq!(balance["xp"], 15);
}

#[tokio::test]
async fn debit_beyond_balance_reports_shortfall() {
    let harness = TestHarness::new();
    harness.credit(5).await;

    let response = harness
        .post_service(
            "/v1/points/debit",
            json!({
                "userId": harness.test_user_id.to_string(),
                "amount": 10,
                "reason": "Homework Helper"
            }),
        )
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "INSUFFICIENT_BALANCE");
    assert_eq!(body["currentBalance"], 5);
    assert_eq!(body["required"], 10);
    assert_eq!(body["shortfall"], 5);

    assert_eq!(harness.balance().await["balance"], 5);
}

#[tokio::test]
async fn mistyped_fields_get_the_error_envelope() {
    let harness = TestHarness::new();
    harness.credit(20).await;
    let user_id = harness.test_user_id.to_string();

    let cases = [
        (
            "/v1/points/debit",
            json!({ "userId": user_id, "amount": 10.5, "reason": "Homework Helper" }),
        ),
        (
            "/v1/points/credit",
            json!({
                "userId": user_id,
                "amount": "15",
                "reason": "quiz",
                "transactionType": "quiz"
            }),
        ),
    ];

    for (path, request) in cases {
        let response = harness.post_service(path, request).await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false, "{path}");
        assert_eq!(body["error"], "INVALID_REQUEST", "{path}");
        let message = body["message"].as_str().unwrap();
        assert!(!message.contains("i64"), "{path}: {message}");
    }

    assert_eq!(harness.balance().await["balance"], 20);
}

#[tokio::test]
async fn non_json_body_gets_the_error_envelope() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/points/balance")
        .add_header("x-api-key", &harness.service_api_key)
        .text("userId=nobody")
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "INVALID_REQUEST");
}

#[tokio::test]
async fn concurrent_debits_cannot_double_spend() {
    let harness = TestHarness::new();
    harness.credit(10).await;

    let debit = || {
        harness
            .server
            .post("/v1/points/debit")
            .add_header("x-api-key", &harness.service_api_key)
            .json(&json!({
                "userId": harness.test_user_id.to_string(),
                "amount": 10,
                "reason": "Teacher Mode"
            }))
            .into_future()
    };

    let (first, second) = futures::future::join(debit(), debit()).await;
    let mut statuses = [first.status_code(), second.status_code()];
    statuses.sort_by_key(|s| s.as_u16());

    assert_eq!(statuses, [StatusCode::OK, StatusCode::PAYMENT_REQUIRED]);
    assert_eq!(harness.balance().await["balance"], 0);
}

// ============================================================================
// Transactions
// ============================================================================

#[tokio::test]
async fn list_transactions_empty() {
    let harness = TestHarness::new();

    let response = harness
        .post_service(
            "/v1/points/transactions",
            json!({ "userId": harness.test_user_id.to_string() }),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["transactions"].as_array().unwrap().is_empty());
    assert_eq!(body["hasMore"], false);
}

#[tokio::test]
async fn transactions_audit_every_mutation() {
    let harness = TestHarness::new();
    harness.credit(20).await;
    harness
        .post_service(
            "/v1/points/debit",
            json!({
                "userId": harness.test_user_id.to_string(),
                "amount": 5,
                "reason": "Flashcards",
                "featureKey": "flashcards"
            }),
        )
        .await
        .assert_status_ok();
    // Rejected debits leave no row.
    harness
        .post_service(
            "/v1/points/debit",
            json!({
                "userId": harness.test_user_id.to_string(),
                "amount": 500,
                "reason": "Voice Tutor"
            }),
        )
        .await
        .assert_status(StatusCode::PAYMENT_REQUIRED);

    let response = harness
        .post_service(
            "/v1/points/transactions",
            json!({ "userId": harness.test_user_id.to_string() }),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);

    assert_eq!(transactions[0]["transactionType"], "deduction");
    assert_eq!(transactions[0]["amount"], -5);
    assert_eq!(transactions[0]["balanceAfter"], 15);
    assert_eq!(transactions[0]["metadata"]["featureKey"], "flashcards");
    assert_eq!(transactions[0]["userId"], harness.test_user_id.to_string());
    assert!(transactions[0]["createdAt"].is_string());
    assert!(transactions[0].get("balance_after").is_none());

    assert_eq!(transactions[1]["transactionType"], "bonus");
    assert_eq!(transactions[1]["amount"], 20);
    assert_eq!(transactions[1]["balanceAfter"], 20);
}

#[tokio::test]
async fn list_transactions_with_pagination() {
    let harness = TestHarness::new();
    for _ in 0..3 {
        harness.credit(1).await;
    }

    let response = harness
        .post_service(
            "/v1/points/transactions",
            json!({
                "userId": harness.test_user_id.to_string(),
                "limit": 2,
                "offset": 0
            }),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(body["hasMore"], true);
    assert_eq!(body["transactions"][0]["balanceAfter"], 3);

    let response = harness
        .post_service(
            "/v1/points/transactions",
            json!({
                "userId": harness.test_user_id.to_string(),
                "limit": 2,
                "offset": 2
            }),
        )
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
    assert_eq!(body["hasMore"], false);
}
