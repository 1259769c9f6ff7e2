//! Source verification through the Etherscan v2 multichain API.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::{DeployConfig, ExplorerConfig};
use crate::error::AppError;

/// Envelope of every Etherscan response.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed,
}

/// Outcome of a status poll, with the explorer's raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: VerificationStatus,
    pub detail: String,
}

impl VerificationStatus {
    /// Interpret the `result` text of `checkverifystatus`.
    pub fn from_result(result: &str) -> Self {
        let lower = result.to_ascii_lowercase();
        if lower.starts_with("pass") || lower.contains("already verified") {
            Self::Verified
        } else if lower.contains("pending") || lower.contains("queue") {
            Self::Pending
        } else {
            Self::Failed
        }
    }
}

/// What the explorer needs to recompile the deployed contract.
pub struct VerificationRequest<'a> {
    pub chain_id: u64,
    pub contract_address: &'a str,
    pub source: &'a str,
    /// Hex ABI-encoded constructor arguments, without `0x`.
    pub constructor_args: &'a str,
}

pub struct ExplorerClient<'a> {
    http: &'a reqwest::Client,
    config: &'a ExplorerConfig,
}

impl<'a> ExplorerClient<'a> {
    pub fn new(http: &'a reqwest::Client, config: &'a ExplorerConfig) -> Self {
        Self { http, config }
    }

    /// Submit the source and return the explorer's GUID for polling.
    #[instrument(skip(self, req, deploy), fields(chain_id = req.chain_id, address = req.contract_address))]
    pub async fn submit(
        &self,
        req: &VerificationRequest<'_>,
        deploy: &DeployConfig,
    ) -> Result<String, AppError> {
        let runs = deploy.optimization_runs.to_string();
        let form = [
            ("apikey", self.config.api_key.as_str()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", req.contract_address),
            ("sourceCode", req.source),
            ("codeformat", "solidity-single-file"),
            ("contractname", deploy.contract_name.as_str()),
            ("compilerversion", deploy.compiler_version.as_str()),
            ("optimizationUsed", "1"),
            ("runs", runs.as_str()),
            // Etherscan's own spelling.
            ("constructorArguements", req.constructor_args),
            ("licenseType", "3"),
        ];

        let res: ApiResponse = self
            .http
            .post(&self.config.api_base)
            .query(&[("chainid", req.chain_id.to_string())])
            .form(&form)
            .send()
            .await?
            .json()
            .await?;

        if res.status != "1" {
            if res.result.to_ascii_lowercase().contains("already verified") {
                return Err(AppError::Conflict("Contract is already verified".into()));
            }
            warn!(message = %res.message, result = %res.result, "Verification rejected");
            return Err(AppError::Upstream(format!(
                "Explorer rejected verification: {}",
                res.result
            )));
        }

        info!(guid = %res.result, "Verification submitted");
        Ok(res.result)
    }

    #[instrument(skip(self))]
    pub async fn status(&self, chain_id: u64, guid: &str) -> Result<StatusReport, AppError> {
        let chain = chain_id.to_string();
        let res: ApiResponse = self
            .http
            .get(&self.config.api_base)
            .query(&[
                ("chainid", chain.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
                ("apikey", self.config.api_key.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        Ok(StatusReport {
            status: VerificationStatus::from_result(&res.result),
            detail: res.result,
        })
    }
}
