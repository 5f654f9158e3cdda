use anyhow::Result;
use serde_json::json;
use zexpander_quota_ledger::{KeyValueStore, SqliteStore};

use super::{history_entry, random_user_id, TestHarness};

#[tokio::test(flavor = "multi_thread")]
async fn test_usage_and_history_survive_restart() -> Result<()> {
    let mut harness = TestHarness::new().await?;
    let user = random_user_id("durable");

    harness
        .post_json(&user, "/api/ledger/plan", &json!({ "plan": "Pro" }))
        .await?;
    harness
        .post_json(
            &user,
            "/api/ledger/usage",
            &json!({ "feature": "expansions", "amount": 1234 }),
        )
        .await?;
    harness
        .post_json(&user, "/api/history", &history_entry("kept across restarts"))
        .await?;

    harness.restart().await?;

    let session = harness.get_json(&user, "/api/ledger").await?;
    assert_eq!(session["record"]["plan"], "Pro");
    assert_eq!(session["record"]["dailyTokensUsed"], 1234);

    let history = harness.get_json(&user, "/api/history").await?;
    assert_eq!(history["items"][0]["original"], "kept across restarts");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_corrupt_record_resets_to_free() -> Result<()> {
    let mut harness = TestHarness::new().await?;
    let user = random_user_id("corrupt");

    harness
        .post_json(&user, "/api/ledger/plan", &json!({ "plan": "Unlimited" }))
        .await?;
    harness.stop().await?;

    {
        let store = SqliteStore::new(&harness.data_dir())?;
        store.set(&format!("zexpander-user-plan-{user}"), "{\"plan\":")?;
    }

    harness.start().await?;
    let session = harness.get_json(&user, "/api/ledger").await?;
    assert_eq!(session["record"]["plan"], "Free");
    assert_eq!(session["record"]["dailyTokensUsed"], 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stale_record_rolls_over_on_load() -> Result<()> {
    let mut harness = TestHarness::new().await?;
    let user = random_user_id("yesterday");
    harness.stop().await?;

    {
        let store = SqliteStore::new(&harness.data_dir())?;
        store.set(
            &format!("zexpander-user-plan-{user}"),
            r#"{"plan":"Free","isPremium":false,"dailyTokensUsed":5000,"dailyFileUploadsUsed":5,"lastUsageDate":"2000-01-01"}"#,
        )?;
    }

    harness.start().await?;
    let session = harness.get_json(&user, "/api/ledger").await?;
    assert_eq!(session["record"]["dailyTokensUsed"], 0);
    assert_eq!(session["record"]["dailyFileUploadsUsed"], 0);
    assert_ne!(session["record"]["lastUsageDate"], "2000-01-01");

    let check = harness
        .post_json(&user, "/api/ledger/check", &json!({ "feature": "fileUploads", "cost": 1 }))
        .await?;
    assert_eq!(check["allowed"], true);
    Ok(())
}
