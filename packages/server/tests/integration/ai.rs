use httpmock::Method::POST;
use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn generation_requires_a_token() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::AI_TEXT,
            &json!({"kind": "tagline", "name": "Crafted", "ticker": "CRF"}),
        )
        .await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn writes_a_tagline() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let completion = app
        .mock
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/v1/chat/completions")
                .body_contains("Crafted");
            then.status(200).json_body(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "created": 1700000000,
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Craft what comes next."},
                    "finish_reason": "stop"
                }]
            }));
        })
        .await;

    let res = app
        .post_with_token(
            routes::AI_TEXT,
            &json!({"kind": "tagline", "name": "Crafted", "ticker": "CRF"}),
            &token,
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["text"], "Craft what comes next.");
    completion.assert_async().await;
}

#[tokio::test]
async fn rejects_unknown_kinds() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();

    let res = app
        .post_with_token(
            routes::AI_TEXT,
            &json!({"kind": "poem", "name": "Crafted", "ticker": "CRF"}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
}
