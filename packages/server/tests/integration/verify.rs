use httpmock::Method::{GET, POST};
use serde_json::json;

use crate::common::{TestApp, routes};

const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

#[tokio::test]
async fn drafts_cannot_be_verified() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let id = app.create_project(&token, "Draft", "DRF").await;

    let res = app
        .post_with_token(&routes::verify(id), &json!({}), &token)
        .await;

    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn submits_source_and_polls_status() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let id = app.create_project(&token, "Verified", "VRF").await;
    app.mark_deployed(id, CONTRACT).await;

    let submit = app
        .mock
        .mock_async(|when, then| {
            when.method(POST)
                .path("/explorer/api")
                .query_param("chainid", "137")
                .body_contains("action=verifysourcecode")
                .body_contains(format!("contractaddress={CONTRACT}"))
                .body_contains("contract+TokenCrafterERC20");
            then.status(200).json_body(json!({
                "status": "1",
                "message": "OK",
                "result": "guid-abc",
            }));
        })
        .await;
    let poll = app
        .mock
        .mock_async(|when, then| {
            when.method(GET)
                .path("/explorer/api")
                .query_param("action", "checkverifystatus")
                .query_param("guid", "guid-abc");
            then.status(200).json_body(json!({
                "status": "1",
                "message": "OK",
                "result": "Pass - Verified",
            }));
        })
        .await;

    let res = app
        .post_with_token(&routes::verify(id), &json!({}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["guid"], "guid-abc");
    submit.assert_async().await;

    let res = app
        .get_with_token(&routes::verify_status(id, "guid-abc"), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "verified");
    assert_eq!(res.body["detail"], "Pass - Verified");
    poll.assert_async().await;
}

#[tokio::test]
async fn only_the_owner_can_verify() {
    let app = TestApp::spawn().await;
    let (_, owner) = app.new_user();
    let (_, stranger) = app.new_user();
    let id = app.create_project(&owner, "Mine", "MINE").await;
    app.mark_deployed(id, CONTRACT).await;

    let res = app
        .post_with_token(&routes::verify(id), &json!({}), &stranger)
        .await;

    assert_eq!(res.status, 403);
}
