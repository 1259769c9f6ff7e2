use httpmock::Method::POST;
use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn checkout_creates_the_customer_once() {
    let app = TestApp::spawn().await;
    let (user_id, token) = app.new_user();
    let project_id = app.create_project(&token, "Paid", "PAID").await;

    let customers = app
        .mock
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/customers")
                .header("authorization", "Bearer sk_test_integration");
            then.status(200).json_body(json!({"id": "cus_123"}));
        })
        .await;
    let sessions = app
        .mock
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/checkout/sessions")
                .body_contains("customer=cus_123")
                .body_contains("price_pro");
            then.status(200).json_body(json!({
                "id": "cs_test_1",
                "url": "https://checkout.stripe.com/c/pay/cs_test_1",
            }));
        })
        .await;

    let body = json!({"plan": "pro", "project_id": project_id});
    let res = app.post_with_token(routes::CHECKOUT, &body, &token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["session_id"], "cs_test_1");
    assert_eq!(res.body["url"], "https://checkout.stripe.com/c/pay/cs_test_1");

    let res = app.post_with_token(routes::CHECKOUT, &body, &token).await;
    assert_eq!(res.status, 200, "{}", res.text);

    customers.assert_hits_async(1).await;
    sessions.assert_hits_async(2).await;
    let stored = app.profile(user_id).await.unwrap();
    assert_eq!(stored.stripe_customer_id.as_deref(), Some("cus_123"));
}

#[tokio::test]
async fn checkout_rejects_the_free_plan() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();

    let res = app
        .post_with_token(routes::CHECKOUT, &json!({"plan": "free"}), &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn checkout_rejects_someone_elses_project() {
    let app = TestApp::spawn().await;
    let (_, owner) = app.new_user();
    let (_, other) = app.new_user();
    let project_id = app.create_project(&owner, "Theirs", "THR").await;

    let res = app
        .post_with_token(
            routes::CHECKOUT,
            &json!({"plan": "basic", "project_id": project_id}),
            &other,
        )
        .await;

    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn stripe_errors_surface_as_upstream_errors() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    app.mock
        .mock_async(|when, then| {
            when.method(POST).path("/v1/customers");
            then.status(402)
                .json_body(json!({"error": {"message": "Your card was declined."}}));
        })
        .await;

    let res = app
        .post_with_token(routes::CHECKOUT, &json!({"plan": "basic"}), &token)
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn portal_requires_a_billing_account() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    app.get_with_token(routes::ME, &token).await;

    let res = app.post_with_token(routes::PORTAL, &json!({}), &token).await;

    assert_eq!(res.status, 400);
}
