use alloy::signers::SignerSync;
use alloy::signers::local::PrivateKeySigner;
use serde_json::json;
use server::chain::gate::access_message;

use crate::common::{TestApp, routes};

const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

fn sign(signer: &PrivateKeySigner, slug: &str) -> String {
    let signature = signer
        .sign_message_sync(access_message(slug).as_bytes())
        .unwrap();
    format!("0x{}", hex::encode(signature.as_bytes()))
}

fn item(slug: &str) -> serde_json::Value {
    json!({
        "slug": slug,
        "title": "Holders AMA",
        "content_type": "video",
        "content_url": "https://videos.example/ama",
        "min_balance": "1000",
    })
}

async fn deployed_project(app: &TestApp, token: &str) -> i32 {
    let id = app.create_project(token, "Gated", "GATE").await;
    app.mark_deployed(id, CONTRACT).await;
    id
}

#[tokio::test]
async fn content_needs_a_deployed_token() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let id = app.create_project(&token, "Draft", "DRF").await;

    let res = app
        .post_with_token(&routes::locked_content(id), &item("draft-ama"), &token)
        .await;

    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn owner_creates_and_public_sees_the_summary() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let id = deployed_project(&app, &token).await;

    let created = app
        .post_with_token(&routes::locked_content(id), &item("holders-ama"), &token)
        .await;
    assert_eq!(created.status, 201, "{}", created.text);
    assert_eq!(created.body["slug"], "holders-ama");
    assert_eq!(created.body["content_url"], "https://videos.example/ama");

    let listed = app.get_without_token(&routes::locked_content(id)).await;
    assert_eq!(listed.status, 200, "{}", listed.text);
    let items = listed.body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["slug"], "holders-ama");
    assert!(items[0].get("content_url").is_none());
}

#[tokio::test]
async fn slug_is_generated_when_omitted_and_must_be_unique() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let id = deployed_project(&app, &token).await;

    let mut body = item("unused");
    body.as_object_mut().unwrap().remove("slug");
    let generated = app
        .post_with_token(&routes::locked_content(id), &body, &token)
        .await;
    assert_eq!(generated.status, 201, "{}", generated.text);
    assert!(
        generated.body["slug"]
            .as_str()
            .unwrap()
            .starts_with("holders-ama-")
    );

    let first = app
        .post_with_token(&routes::locked_content(id), &item("vip"), &token)
        .await;
    assert_eq!(first.status, 201);
    let dup = app
        .post_with_token(&routes::locked_content(id), &item("vip"), &token)
        .await;
    assert_eq!(dup.status, 409);
}

#[tokio::test]
async fn only_the_owner_manages_content() {
    let app = TestApp::spawn().await;
    let (_, owner) = app.new_user();
    let (_, stranger) = app.new_user();
    let id = deployed_project(&app, &owner).await;

    let res = app
        .post_with_token(&routes::locked_content(id), &item("stolen"), &stranger)
        .await;
    assert_eq!(res.status, 403);

    app.post_with_token(&routes::locked_content(id), &item("mine"), &owner)
        .await;
    let res = app
        .delete_with_token(&routes::locked_item("mine"), &stranger)
        .await;
    assert_eq!(res.status, 403);

    let res = app.delete_with_token(&routes::locked_item("mine"), &owner).await;
    assert_eq!(res.status, 204);
    let res = app.get_without_token(&routes::locked_content(id)).await;
    assert!(res.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn access_requires_a_signature_from_the_claimed_wallet() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let id = deployed_project(&app, &token).await;
    app.post_with_token(&routes::locked_content(id), &item("secret"), &token)
        .await;

    let holder = PrivateKeySigner::random();
    let impostor = PrivateKeySigner::random();

    let res = app
        .post_without_token(
            &routes::locked_access("secret"),
            &json!({
                "wallet_address": holder.address().to_checksum(None),
                "signature": sign(&impostor, "secret"),
            }),
        )
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");

    // Signed for another slug.
    let res = app
        .post_without_token(
            &routes::locked_access("secret"),
            &json!({
                "wallet_address": holder.address().to_checksum(None),
                "signature": sign(&holder, "other"),
            }),
        )
        .await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn access_to_unknown_content_is_not_found() {
    let app = TestApp::spawn().await;
    let holder = PrivateKeySigner::random();

    let res = app
        .post_without_token(
            &routes::locked_access("missing"),
            &json!({
                "wallet_address": holder.address().to_checksum(None),
                "signature": sign(&holder, "missing"),
            }),
        )
        .await;

    assert_eq!(res.status, 404);
}

/// `balanceOf` result for `whole` tokens.
fn balance_word(whole: u128) -> serde_json::Value {
    json!(format!("0x{:064x}", whole * 1_000_000_000_000_000_000))
}

#[tokio::test]
async fn holders_above_the_threshold_get_the_content() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let id = deployed_project(&app, &token).await;
    app.post_with_token(&routes::locked_content(id), &item("vip-room"), &token)
        .await;
    let balance = app.mock_rpc(137, "eth_call", balance_word(1000)).await;

    let holder = PrivateKeySigner::random();
    let res = app
        .post_without_token(
            &routes::locked_access("vip-room"),
            &json!({
                "wallet_address": holder.address().to_checksum(None),
                "signature": sign(&holder, "vip-room"),
            }),
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["slug"], "vip-room");
    assert_eq!(res.body["content_url"], "https://videos.example/ama");
    balance.assert_async().await;
}

#[tokio::test]
async fn holders_below_the_threshold_are_denied() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let id = deployed_project(&app, &token).await;
    app.post_with_token(&routes::locked_content(id), &item("whale-room"), &token)
        .await;
    app.mock_rpc(137, "eth_call", balance_word(999)).await;

    let holder = PrivateKeySigner::random();
    let res = app
        .post_without_token(
            &routes::locked_access("whale-room"),
            &json!({
                "wallet_address": holder.address().to_checksum(None),
                "signature": sign(&holder, "whale-room"),
            }),
        )
        .await;

    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
    assert!(res.body.get("content_url").is_none());
}
