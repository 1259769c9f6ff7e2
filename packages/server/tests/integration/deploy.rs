use std::str::FromStr;

use alloy::signers::local::PrivateKeySigner;
use httpmock::Method::POST;
use sea_orm::EntityTrait;
use serde_json::json;

use server::entity::project;

use crate::common::{OWNER_ADDRESS, PLATFORM_KEY, TestApp, routes};

const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const RECIPIENT_A: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
const RECIPIENT_B: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

fn tx_hash(byte: &str) -> String {
    format!("0x{}", byte.repeat(32))
}

mod deploy_token {
    use super::*;

    #[tokio::test]
    async fn unpaid_projects_are_refused() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Unpaid", "UNP").await;

        let res = app
            .post_with_token(
                routes::DEPLOYMENTS,
                &json!({"project_id": id, "owner_address": OWNER_ADDRESS}),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PROJECT_NOT_PAID");
    }

    #[tokio::test]
    async fn malformed_owner_address_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Typo", "TYP").await;

        let res = app
            .post_with_token(
                routes::DEPLOYMENTS,
                &json!({"project_id": id, "owner_address": "0x1234"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn deployed_projects_cannot_be_deployed_again() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Twice", "TWC").await;
        app.mark_deployed(id, CONTRACT).await;

        let res = app
            .post_with_token(
                routes::DEPLOYMENTS,
                &json!({"project_id": id, "owner_address": OWNER_ADDRESS}),
                &token,
            )
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn plan_limit_blocks_further_deployments() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let first = app.create_project(&token, "First", "ONE").await;
        app.mark_deployed(first, CONTRACT).await;
        let second = app.create_project(&token, "Second", "TWO").await;
        app.mark_paid(second).await;

        let res = app
            .post_with_token(
                routes::DEPLOYMENTS,
                &json!({"project_id": second, "owner_address": OWNER_ADDRESS}),
                &token,
            )
            .await;

        assert_eq!(res.status, 403, "{}", res.text);
        assert_eq!(res.body["code"], "PLAN_LIMIT_REACHED");
    }

    #[tokio::test]
    async fn submits_and_returns_the_precomputed_address() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Launch", "LCH").await;
        app.mark_paid(id).await;

        app.mock_funded_wallet(7).await;
        let sends = app
            .mock_rpc(137, "eth_sendRawTransaction", json!(tx_hash("12")))
            .await;
        let receipts = app
            .mock_rpc(137, "eth_getTransactionReceipt", json!(null))
            .await;

        let res = app
            .post_with_token(
                routes::DEPLOYMENTS,
                &json!({"project_id": id, "owner_address": OWNER_ADDRESS}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let expected = PrivateKeySigner::from_str(PLATFORM_KEY)
            .unwrap()
            .address()
            .create(7)
            .to_checksum(None);
        assert_eq!(res.body["contract_address"], expected);
        assert_eq!(res.body["tx_hash"], tx_hash("12"));
        assert_eq!(res.body["persisted"], true);
        sends.assert_hits_async(1).await;
        // Submission returns without waiting for the transaction to be mined.
        receipts.assert_hits_async(0).await;

        let stored = project::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.contract_address.as_deref(), Some(expected.as_str()));
        assert_eq!(stored.tx_hash, Some(tx_hash("12")));
        assert_eq!(stored.owner_address.as_deref(), Some(OWNER_ADDRESS));
        assert!(stored.deployed_at.is_some());
    }

    #[tokio::test]
    async fn underfunded_platform_wallet_aborts_before_sending() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Broke", "BRK").await;
        app.mark_paid(id).await;

        let balance = app
            .mock
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/rpc/137")
                    .body_contains("eth_getBalance");
                then.status(200)
                    .json_body(json!({"jsonrpc": "2.0", "id": 0, "result": "0x0"}));
            })
            .await;
        let sends = app
            .mock
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/rpc/137")
                    .body_contains("eth_sendRawTransaction");
                then.status(500);
            })
            .await;

        let res = app
            .post_with_token(
                routes::DEPLOYMENTS,
                &json!({"project_id": id, "owner_address": OWNER_ADDRESS}),
                &token,
            )
            .await;

        assert_eq!(res.status, 500, "{}", res.text);
        assert_eq!(res.body["code"], "INSUFFICIENT_FUNDS");
        balance.assert_async().await;
        sends.assert_hits_async(0).await;
    }
}

mod record {
    use super::*;

    #[tokio::test]
    async fn records_onto_a_paid_draft() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Self Deployed", "SELF").await;
        app.mark_paid(id).await;

        let res = app
            .post_with_token(
                routes::RECORD_DEPLOYMENT,
                &json!({
                    "project_id": id,
                    "chain_id": 137,
                    "contract_address": CONTRACT.to_lowercase(),
                    "tx_hash": tx_hash("AB"),
                    "owner_address": OWNER_ADDRESS,
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], id);
        assert_eq!(res.body["contract_address"], CONTRACT);
        assert_eq!(res.body["tx_hash"], tx_hash("ab"));
        assert!(res.body["deployed_at"].is_string());
    }

    #[tokio::test]
    async fn unpaid_drafts_cannot_take_a_deployment() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Unpaid", "UNP").await;

        let res = app
            .post_with_token(
                routes::RECORD_DEPLOYMENT,
                &json!({
                    "project_id": id,
                    "chain_id": 137,
                    "contract_address": CONTRACT,
                    "tx_hash": tx_hash("ab"),
                    "owner_address": OWNER_ADDRESS,
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PROJECT_NOT_PAID");
        let stored = project::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.contract_address.is_none());
    }

    #[tokio::test]
    async fn deployed_projects_keep_their_deployment() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Settled", "SET").await;
        app.mark_deployed(id, CONTRACT).await;

        let other_chain = app
            .post_with_token(
                routes::RECORD_DEPLOYMENT,
                &json!({
                    "project_id": id,
                    "chain_id": 80002,
                    "contract_address": CONTRACT,
                    "tx_hash": tx_hash("ab"),
                    "owner_address": OWNER_ADDRESS,
                }),
                &token,
            )
            .await;
        assert_eq!(other_chain.status, 409, "{}", other_chain.text);
        assert_eq!(other_chain.body["code"], "CONFLICT");

        let other_contract = app
            .post_with_token(
                routes::RECORD_DEPLOYMENT,
                &json!({
                    "project_id": id,
                    "chain_id": 137,
                    "contract_address": OWNER_ADDRESS,
                    "tx_hash": tx_hash("ab"),
                    "owner_address": OWNER_ADDRESS,
                }),
                &token,
            )
            .await;
        assert_eq!(other_contract.status, 409);

        let stored = project::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.chain_id, 137);
        assert_eq!(stored.contract_address.as_deref(), Some(CONTRACT));
    }

    #[tokio::test]
    async fn replaying_the_stored_deployment_is_accepted() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Replay", "RPL").await;
        app.mark_deployed(id, CONTRACT).await;

        let res = app
            .post_with_token(
                routes::RECORD_DEPLOYMENT,
                &json!({
                    "project_id": id,
                    "chain_id": 137,
                    "contract_address": CONTRACT.to_lowercase(),
                    "tx_hash": tx_hash("AB"),
                    "owner_address": OWNER_ADDRESS,
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], id);
        assert_eq!(res.body["contract_address"], CONTRACT);
    }

    #[tokio::test]
    async fn creates_a_project_from_metadata() {
        let app = TestApp::spawn().await;
        let (user_id, token) = app.new_user();

        let res = app
            .post_with_token(
                routes::RECORD_DEPLOYMENT,
                &json!({
                    "chain_id": 80002,
                    "contract_address": CONTRACT,
                    "tx_hash": tx_hash("cd"),
                    "owner_address": OWNER_ADDRESS,
                    "name": "Testnet Coin",
                    "ticker": "tst",
                    "initial_supply": "5000",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["user_id"], user_id.to_string());
        assert_eq!(res.body["ticker"], "TST");
        assert_eq!(res.body["chain_id"], 80002);
        assert_eq!(res.body["is_paid"], true);
    }

    #[tokio::test]
    async fn new_records_need_metadata() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();

        let res = app
            .post_with_token(
                routes::RECORD_DEPLOYMENT,
                &json!({
                    "chain_id": 137,
                    "contract_address": CONTRACT,
                    "tx_hash": tx_hash("cd"),
                    "owner_address": OWNER_ADDRESS,
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn cannot_record_onto_someone_elses_project() {
        let app = TestApp::spawn().await;
        let (_, owner) = app.new_user();
        let (_, other) = app.new_user();
        let id = app.create_project(&owner, "Theirs", "THR").await;

        let res = app
            .post_with_token(
                routes::RECORD_DEPLOYMENT,
                &json!({
                    "project_id": id,
                    "chain_id": 137,
                    "contract_address": CONTRACT,
                    "tx_hash": tx_hash("ef"),
                    "owner_address": OWNER_ADDRESS,
                }),
                &other,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn records_count_against_the_plan() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let body = |hash: &str| {
            json!({
                "chain_id": 137,
                "contract_address": CONTRACT,
                "tx_hash": tx_hash(hash),
                "owner_address": OWNER_ADDRESS,
                "name": "Again",
                "ticker": "AGN",
                "initial_supply": "1",
            })
        };

        let first = app
            .post_with_token(routes::RECORD_DEPLOYMENT, &body("01"), &token)
            .await;
        assert_eq!(first.status, 200, "{}", first.text);

        let second = app
            .post_with_token(routes::RECORD_DEPLOYMENT, &body("02"), &token)
            .await;
        assert_eq!(second.status, 403);
        assert_eq!(second.body["code"], "PLAN_LIMIT_REACHED");
    }
}

mod airdrop {
    use super::*;

    #[tokio::test]
    async fn requires_a_deployed_project() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Draft", "DRF").await;

        let res = app
            .post_with_token(
                routes::AIRDROPS,
                &json!({
                    "project_id": id,
                    "recipients": [{"address": OWNER_ADDRESS, "amount": "10"}],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn rejects_duplicate_recipients() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Live", "LIV").await;
        app.mark_deployed(id, CONTRACT).await;

        let res = app
            .post_with_token(
                routes::AIRDROPS,
                &json!({
                    "project_id": id,
                    "recipients": [
                        {"address": OWNER_ADDRESS, "amount": "10"},
                        {"address": OWNER_ADDRESS.to_lowercase(), "amount": "5"},
                    ],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn short_allowance_sends_nothing() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Stingy", "STG").await;
        app.mark_deployed(id, CONTRACT).await;

        app.mock_funded_wallet(0).await;
        let allowance = app
            .mock_rpc(137, "eth_call", json!(format!("0x{:064x}", 0)))
            .await;
        let sends = app
            .mock_rpc(137, "eth_sendRawTransaction", json!(tx_hash("34")))
            .await;

        let res = app
            .post_with_token(
                routes::AIRDROPS,
                &json!({
                    "project_id": id,
                    "recipients": [{"address": RECIPIENT_A, "amount": "10"}],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        allowance.assert_async().await;
        sends.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn sends_one_transfer_per_recipient() {
        let app = TestApp::spawn().await;
        let (_, token) = app.new_user();
        let id = app.create_project(&token, "Generous", "GEN").await;
        app.mark_deployed(id, CONTRACT).await;

        app.mock_funded_wallet(3).await;
        // 100 whole tokens approved.
        app.mock_rpc(
            137,
            "eth_call",
            json!(format!("0x{:064x}", 100_000_000_000_000_000_000u128)),
        )
        .await;
        let sends = app
            .mock_rpc(137, "eth_sendRawTransaction", json!(tx_hash("56")))
            .await;

        let res = app
            .post_with_token(
                routes::AIRDROPS,
                &json!({
                    "project_id": id,
                    "recipients": [
                        {"address": RECIPIENT_A, "amount": "10"},
                        {"address": RECIPIENT_B, "amount": "2.5"},
                    ],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["complete"], true);
        let expected_operator = PrivateKeySigner::from_str(PLATFORM_KEY)
            .unwrap()
            .address()
            .to_checksum(None);
        assert_eq!(res.body["operator"], expected_operator);
        let transfers = res.body["transfers"].as_array().unwrap();
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0]["address"], RECIPIENT_A);
        assert_eq!(transfers[1]["amount"], "2.500000000000000000");
        sends.assert_hits_async(2).await;
    }
}
