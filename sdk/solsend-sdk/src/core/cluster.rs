use serde::{Deserialize, Serialize};
use solana_sdk::signature::Signature;
use std::fmt;
use std::str::FromStr;

use crate::core::constants::EXPLORER_BASE_URL;
use crate::error::SdkError;

/// Public Solana cluster the session talks to. Only one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
}

impl Cluster {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::MainnetBeta => "mainnet-beta",
        }
    }

    /// Public JSON-RPC endpoint of the cluster
    pub fn endpoint(&self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
        }
    }

    /// Chain id used by the token-list registry
    pub fn chain_id(&self) -> u64 {
        match self {
            Cluster::MainnetBeta => 101,
            Cluster::Testnet => 102,
            Cluster::Devnet => 103,
        }
    }

    /// Explorer page of a transaction. Mainnet links carry no cluster query.
    pub fn explorer_tx_url(&self, signature: &Signature) -> String {
        match self {
            Cluster::MainnetBeta => format!("{}/tx/{}", EXPLORER_BASE_URL, signature),
            other => format!(
                "{}/tx/{}?cluster={}",
                EXPLORER_BASE_URL,
                signature,
                other.as_str()
            ),
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cluster {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "mainnet" | "mainnet-beta" => Ok(Cluster::MainnetBeta),
            other => Err(SdkError::Config(format!("unknown cluster: {}", other))),
        }
    }
}
