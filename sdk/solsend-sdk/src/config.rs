use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use std::path::{Path, PathBuf};

use crate::core::cluster::Cluster;
use crate::error::{Result, SdkError};

pub const ENV_CLUSTER: &str = "SOLSEND_CLUSTER";
pub const ENV_RPC_URL: &str = "RPC_URL";
pub const ENV_REGISTRY: &str = "SOLSEND_REGISTRY";

/// Session configuration: which cluster to talk to and where the static
/// token registry lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SdkConfig {
    pub cluster: Cluster,

    /// Overrides the public endpoint of `cluster`
    pub rpc_url: Option<String>,

    /// processed | confirmed | finalized
    pub commitment: String,

    /// Token-list JSON file used as the static registry
    pub registry_path: Option<PathBuf>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::Devnet,
            rpc_url: None,
            commitment: "confirmed".to_string(),
            registry_path: None,
        }
    }
}

impl SdkConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: SdkConfig = toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cluster) = lookup(ENV_CLUSTER) {
            self.cluster = cluster.parse()?;
        }
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc_url = Some(url);
        }
        if let Some(path) = lookup(ENV_REGISTRY) {
            self.registry_path = Some(PathBuf::from(path));
        }
        self.validate()
    }

    pub fn rpc_url(&self) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| self.cluster.endpoint().to_string())
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        match self.commitment.as_str() {
            "processed" => CommitmentConfig::processed(),
            "finalized" => CommitmentConfig::finalized(),
            _ => CommitmentConfig::confirmed(),
        }
    }

    fn validate(&self) -> Result<()> {
        match self.commitment.as_str() {
            "processed" | "confirmed" | "finalized" => Ok(()),
            other => Err(SdkError::Config(format!("unknown commitment: {}", other))),
        }
    }
}
