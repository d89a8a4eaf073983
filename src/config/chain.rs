//! Chain connection settings.
//!
//! Which network to talk to is plain configuration: the RPC endpoint and the two
//! contract addresses come from `config.toml`, and `RPC_URL` in the environment
//! overrides the endpoint without editing the file.

use crate::errors::{Error, Result};
use alloy::primitives::Address;
use serde::Deserialize;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
// First two deployments on a fresh local hardhat node.
const DEFAULT_SPENDING_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const DEFAULT_FEEDBACK_CONTRACT: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

/// `[chain]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSettings {
    /// Label for logs and the health endpoint, e.g. `"local"` or `"amoy"`
    #[serde(default = "default_network")]
    pub network: String,
    /// JSON-RPC endpoint from the file
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Address of the spending contract
    #[serde(default = "default_spending_contract")]
    pub spending_contract: String,
    /// Address of the feedback contract
    #[serde(default = "default_feedback_contract")]
    pub feedback_contract: String,
}

fn default_network() -> String {
    "local".to_string()
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_spending_contract() -> String {
    DEFAULT_SPENDING_CONTRACT.to_string()
}

fn default_feedback_contract() -> String {
    DEFAULT_FEEDBACK_CONTRACT.to_string()
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            network: default_network(),
            rpc_url: default_rpc_url(),
            spending_contract: default_spending_contract(),
            feedback_contract: default_feedback_contract(),
        }
    }
}

impl ChainSettings {
    /// RPC endpoint, preferring the `RPC_URL` environment variable.
    #[must_use]
    pub fn rpc_url(&self) -> String {
        std::env::var("RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }

    /// Parsed spending contract address.
    pub fn spending_address(&self) -> Result<Address> {
        parse_address("spending_contract", &self.spending_contract)
    }

    /// Parsed feedback contract address.
    pub fn feedback_address(&self) -> Result<Address> {
        parse_address("feedback_contract", &self.feedback_contract)
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address> {
    value.trim().parse::<Address>().map_err(|e| Error::Config {
        message: format!("Invalid {field} address '{value}': {e}"),
    })
}
