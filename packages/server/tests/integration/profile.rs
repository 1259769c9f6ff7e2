use serde_json::json;

use crate::common::{OWNER_ADDRESS, TestApp, routes};

#[tokio::test]
async fn me_requires_a_token() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::ME).await;

    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_MISSING");
}

#[tokio::test]
async fn me_rejects_a_token_signed_with_another_secret() {
    let app = TestApp::spawn().await;
    let mut auth = app.config.auth.clone();
    auth.jwt_secret = "someone-else".into();
    let token = server::utils::jwt::sign(uuid::Uuid::new_v4(), None, &auth).unwrap();

    let res = app.get_with_token(routes::ME, &token).await;

    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn first_visit_creates_a_free_profile() {
    let app = TestApp::spawn().await;
    let (user_id, token) = app.new_user();

    let res = app.get_with_token(routes::ME, &token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["id"], user_id.to_string());
    assert_eq!(res.body["email"], "founder@example.com");
    assert_eq!(res.body["plan"], "free");
    assert_eq!(res.body["limits"]["total"], 1);
    assert_eq!(res.body["usage"]["total"], 0);
    assert_eq!(res.body["has_billing_account"], false);

    let stored = app.profile(user_id).await.expect("profile row");
    assert_eq!(stored.plan_activo, "free");

    // A second visit reuses the row.
    let again = app.get_with_token(routes::ME, &token).await;
    assert_eq!(again.status, 200);
    assert_eq!(again.body["created_at"], res.body["created_at"]);
}

#[tokio::test]
async fn usage_counts_recorded_deployments_per_chain() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();

    let recorded = app
        .post_with_token(
            routes::RECORD_DEPLOYMENT,
            &json!({
                "chain_id": 137,
                "contract_address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "tx_hash": format!("0x{}", "12".repeat(32)),
                "owner_address": OWNER_ADDRESS,
                "name": "Crafted",
                "ticker": "crf",
                "initial_supply": "1000",
            }),
            &token,
        )
        .await;
    assert_eq!(recorded.status, 200, "{}", recorded.text);

    let res = app.get_with_token(routes::ME, &token).await;

    assert_eq!(res.body["usage"]["total"], 1);
    let polygon = res.body["usage"]["chains"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["chain_id"] == 137)
        .expect("polygon usage entry");
    assert_eq!(polygon["deployed"], 1);
}
