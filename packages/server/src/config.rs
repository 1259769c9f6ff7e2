use std::collections::HashMap;

use common::Plan;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Log every SQL statement through `tracing`.
    #[serde(default)]
    pub log_statements: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 secret shared with the auth provider that issues user tokens.
    pub jwt_secret: String,
    /// Expected `aud` claim.
    pub audience: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
    /// Plan key (`basic`, `pro`, ...) to Stripe price id.
    #[serde(default)]
    pub prices: HashMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
    pub portal_return_url: String,
    /// Maximum age of a webhook signature timestamp, in seconds.
    pub webhook_tolerance_secs: i64,
}

impl StripeConfig {
    /// Price id configured for a plan, if any.
    pub fn price_for(&self, plan: Plan) -> Option<&str> {
        self.prices
            .get(plan.as_str())
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }

    /// Reverse lookup of a price id to the plan it sells.
    pub fn plan_for_price(&self, price_id: &str) -> Option<Plan> {
        if price_id.is_empty() {
            return None;
        }
        self.prices
            .iter()
            .find(|(_, price)| price.as_str() == price_id)
            .and_then(|(plan, _)| plan.parse().ok())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainsConfig {
    /// Chain id (as a string key) to JSON-RPC endpoint.
    #[serde(default)]
    pub rpc_urls: HashMap<String, String>,
}

impl ChainsConfig {
    pub fn rpc_url(&self, chain_id: u64) -> Option<&str> {
        self.rpc_urls
            .get(&chain_id.to_string())
            .map(String::as_str)
            .filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeployConfig {
    /// Hex private key of the platform wallet that pays for deployments.
    pub private_key: String,
    /// Native balance (in ether units) the wallet must exceed before deploying.
    pub min_balance: String,
    /// Percentage added on top of the network's fee estimate.
    pub gas_bump_percent: u64,
    /// Hardhat or Foundry artifact of the ERC-20 contract.
    pub artifact_path: String,
    /// Flattened Solidity source submitted for explorer verification.
    pub source_path: String,
    pub contract_name: String,
    pub compiler_version: String,
    pub optimization_runs: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_base: String,
    pub text_model: String,
    pub image_model: String,
    pub image_size: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExplorerConfig {
    pub api_base: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    pub api_base: String,
    /// Cached market data younger than this is returned without refetching.
    pub min_refresh_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub stripe: StripeConfig,
    pub chains: ChainsConfig,
    pub deploy: DeployConfig,
    pub openai: OpenAiConfig,
    pub explorer: ExplorerConfig,
    pub market: MarketConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 50)?
            .set_default("database.min_connections", 2)?
            .set_default("auth.audience", "authenticated")?
            .set_default("stripe.api_base", "https://api.stripe.com")?
            .set_default("stripe.success_url", "http://localhost:3000/dashboard?checkout=success")?
            .set_default("stripe.cancel_url", "http://localhost:3000/pricing?checkout=cancel")?
            .set_default("stripe.portal_return_url", "http://localhost:3000/dashboard")?
            .set_default("stripe.webhook_tolerance_secs", 300)?
            .set_default("deploy.min_balance", "0.1")?
            .set_default("deploy.gas_bump_percent", 20)?
            .set_default("deploy.artifact_path", "./contracts/TokenCrafterERC20.json")?
            .set_default("deploy.source_path", "./contracts/TokenCrafterERC20.sol")?
            .set_default("deploy.contract_name", "TokenCrafterERC20")?
            .set_default("deploy.compiler_version", "v0.8.24+commit.e11b9ed9")?
            .set_default("deploy.optimization_runs", 200)?
            .set_default("openai.api_base", "https://api.openai.com/v1")?
            .set_default("openai.text_model", "gpt-4o-mini")?
            .set_default("openai.image_model", "dall-e-3")?
            .set_default("openai.image_size", "1024x1024")?
            .set_default("explorer.api_base", "https://api.etherscan.io/v2/api")?
            .set_default("market.api_base", "https://api.dexscreener.com")?
            .set_default("market.min_refresh_secs", 300)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., TOKENCRAFTER__STRIPE__SECRET_KEY)
            .add_source(Environment::with_prefix("TOKENCRAFTER").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
