use anyhow::Result;
use futures_util::future::join_all;
use serde_json::json;

use super::{history_entry, random_user_id, TestHarness};

#[tokio::test(flavor = "multi_thread")]
async fn test_usage_is_tracked_per_user() -> Result<()> {
    let harness = TestHarness::new().await?;
    let alice = random_user_id("alice");
    let bob = random_user_id("bob");

    harness
        .post_json(
            &alice,
            "/api/ledger/usage",
            &json!({ "feature": "expansions", "amount": 4500 }),
        )
        .await?;

    let bob_view = harness.get_json(&bob, "/api/ledger").await?;
    assert_eq!(bob_view["record"]["dailyTokensUsed"], 0);

    let alice_check = harness
        .post_json(
            &alice,
            "/api/ledger/check",
            &json!({ "feature": "expansions", "cost": 600 }),
        )
        .await?;
    assert_eq!(alice_check["allowed"], false);

    let bob_check = harness
        .post_json(
            &bob,
            "/api/ledger/check",
            &json!({ "feature": "expansions", "cost": 600 }),
        )
        .await?;
    assert_eq!(bob_check["allowed"], true);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_history_is_private_per_user() -> Result<()> {
    let harness = TestHarness::new().await?;
    let alice = random_user_id("alice");
    let bob = random_user_id("bob");

    let created = harness
        .post_json(&alice, "/api/history", &history_entry("alice's note"))
        .await?;
    let id = created["item"]["id"].as_str().unwrap_or_default().to_string();

    let bob_history = harness.get_json(&bob, "/api/history").await?;
    assert!(bob_history["items"].as_array().unwrap().is_empty());

    let response = harness.delete(&bob, &format!("/api/history/{id}")).await?;
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["removed"], 0);

    let alice_history = harness.get_json(&alice, "/api/history").await?;
    assert_eq!(alice_history["items"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_parallel_sessions_do_not_overspend() -> Result<()> {
    let harness = TestHarness::new().await?;
    let user = random_user_id("tabs");

    let body = json!({ "feature": "fileUploads" });
    let requests = (0..20).map(|_| harness.post(&user, "/api/ledger/consume", &body));
    let responses = join_all(requests).await;

    let granted = responses
        .into_iter()
        .filter_map(|response| response.ok())
        .filter(|response| response.status().is_success())
        .count();
    assert_eq!(granted, 5);

    let record = harness.get_json(&user, "/api/ledger").await?;
    assert_eq!(record["record"]["dailyFileUploadsUsed"], 5);
    Ok(())
}
