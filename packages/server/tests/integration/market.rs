use httpmock::Method::GET;
use serde_json::json;

use crate::common::{TestApp, routes};

const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

#[tokio::test]
async fn refresh_requires_a_deployed_project() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let id = app.create_project(&token, "Draft", "DRF").await;

    let res = app
        .post_with_token(&routes::market_refresh(id), &json!({}), &token)
        .await;

    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn refresh_stores_the_deepest_pair_and_then_serves_from_cache() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let id = app.create_project(&token, "Traded", "TRD").await;
    app.mark_deployed(id, CONTRACT).await;

    let dex = app
        .mock
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/dex/latest/dex/tokens/{CONTRACT}"));
            then.status(200).json_body(json!({
                "pairs": [
                    {
                        "chainId": "polygon",
                        "pairAddress": "0xshallow",
                        "priceUsd": "0.010",
                        "liquidity": {"usd": 100.0},
                        "volume": {"h24": 5.0},
                        "marketCap": 1000.0,
                    },
                    {
                        "chainId": "polygon",
                        "pairAddress": "0xdeep",
                        "priceUsd": "0.012",
                        "liquidity": {"usd": 25000.0},
                        "volume": {"h24": 4200.5},
                        "fdv": 120000.0,
                    },
                    {
                        "chainId": "ethereum",
                        "pairAddress": "0xelsewhere",
                        "priceUsd": "9.0",
                        "liquidity": {"usd": 900000.0},
                    },
                ],
            }));
        })
        .await;

    let res = app
        .post_with_token(&routes::market_refresh(id), &json!({}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["cached"], false);
    assert_eq!(res.body["liquidity_usd"], 25000.0);
    assert_eq!(res.body["volume_24h"], 4200.5);
    // No market cap on the pair, so FDV is used.
    assert_eq!(res.body["market_cap"], 120000.0);
    assert_eq!(res.body["price_usd"], 0.012);

    let again = app
        .post_with_token(&routes::market_refresh(id), &json!({}), &token)
        .await;
    assert_eq!(again.status, 200);
    assert_eq!(again.body["cached"], true);
    assert_eq!(again.body["market_cap"], 120000.0);

    dex.assert_hits_async(1).await;

    let project = app.get_with_token(&routes::project(id), &token).await;
    assert_eq!(project.body["market_cap"], 120000.0);
}

#[tokio::test]
async fn tokens_without_pairs_keep_empty_figures() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let id = app.create_project(&token, "Quiet", "QT").await;
    app.mark_deployed(id, CONTRACT).await;
    app.mock
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/dex/latest/dex/tokens/{CONTRACT}"));
            then.status(200).json_body(json!({"pairs": null}));
        })
        .await;

    let res = app
        .post_with_token(&routes::market_refresh(id), &json!({}), &token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert!(res.body["market_cap"].is_null());
    assert!(res.body["updated_at"].is_null());
}
