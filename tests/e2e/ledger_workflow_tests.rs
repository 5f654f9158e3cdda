use anyhow::Result;
use serde_json::json;

use super::{random_user_id, TestHarness};

#[tokio::test(flavor = "multi_thread")]
async fn test_free_user_text_processing_workflow() -> Result<()> {
    let harness = TestHarness::new().await?;
    let user = random_user_id("writer");

    let session = harness.get_json(&user, "/api/ledger").await?;
    assert_eq!(session["record"]["plan"], "Free");
    assert_eq!(session["remaining"]["expansions"], 5000);

    let input = "Draft a friendly reminder about tomorrow's meeting.";
    let cost = input.chars().count();

    let check = harness
        .post_json(
            &user,
            "/api/ledger/check",
            &json!({ "feature": "expansions", "cost": cost }),
        )
        .await?;
    assert_eq!(check["allowed"], true);

    let after = harness
        .post_json(
            &user,
            "/api/ledger/usage",
            &json!({ "feature": "expansions", "amount": cost }),
        )
        .await?;
    assert_eq!(after["record"]["dailyTokensUsed"], cost);
    assert_eq!(after["remaining"]["expansions"], 5000 - cost as i64);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_quota_prompts_upgrade_then_pro_unblocks() -> Result<()> {
    let harness = TestHarness::new().await?;
    let user = random_user_id("uploader");

    for _ in 0..5 {
        harness
            .post_json(&user, "/api/ledger/consume", &json!({ "feature": "fileUploads" }))
            .await?;
    }

    let blocked = harness
        .post(&user, "/api/ledger/consume", &json!({ "feature": "fileUploads" }))
        .await?;
    assert_eq!(blocked.status(), 429);
    let body: serde_json::Value = blocked.json().await?;
    assert_eq!(body["details"]["upgradeRequired"], true);

    let upgraded = harness
        .post_json(&user, "/api/ledger/plan", &json!({ "plan": "Pro" }))
        .await?;
    assert_eq!(upgraded["record"]["isPremium"], true);
    assert_eq!(upgraded["record"]["dailyFileUploadsUsed"], 0);
    assert_eq!(upgraded["remaining"]["fileUploads"], 50);

    let remaining = harness
        .get_json(&user, "/api/ledger/remaining/fileUploads")
        .await?;
    assert_eq!(remaining["remaining"], 50);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthenticated_requests_are_rejected() -> Result<()> {
    let harness = TestHarness::new().await?;

    let response = harness
        .http_client()
        .get(harness.url("/api/ledger"))
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    let response = harness.get("   ", "/api/history").await?;
    assert_eq!(response.status(), 401);
    Ok(())
}
