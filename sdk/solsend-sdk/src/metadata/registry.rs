use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use crate::core::cluster::Cluster;
use crate::error::{Result, SdkError};

/// One token of the static registry, in token-list format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub chain_id: u64,
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(rename = "logoURI", default)]
    pub logo_uri: Option<String>,
}

#[derive(Deserialize)]
struct TokenList {
    tokens: Vec<RegistryEntry>,
}

/// Read-only registry snapshot indexed by mint
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    entries: HashMap<String, RegistryEntry>,
}

impl RegistrySnapshot {
    pub fn new(entries: impl IntoIterator<Item = RegistryEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.address.clone(), entry))
                .collect(),
        }
    }

    /// Parse a token-list document, keeping only the tokens of `chain_id`
    pub fn from_token_list_json(json: &str, chain_id: u64) -> Result<Self> {
        let list: TokenList =
            serde_json::from_str(json).map_err(|e| SdkError::Registry(e.to_string()))?;
        Ok(Self::new(
            list.tokens.into_iter().filter(|t| t.chain_id == chain_id),
        ))
    }

    pub fn get(&self, mint: &str) -> Option<&RegistryEntry> {
        self.entries.get(mint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Static registry lookup
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn resolve(&self) -> Result<RegistrySnapshot>;
}

/// Registry held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    snapshot: RegistrySnapshot,
}

impl StaticRegistry {
    pub fn new(snapshot: RegistrySnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl RegistrySource for StaticRegistry {
    async fn resolve(&self) -> Result<RegistrySnapshot> {
        Ok(self.snapshot.clone())
    }
}

/// Registry read from a token-list JSON file, filtered to one cluster
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
    cluster: Cluster,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>, cluster: Cluster) -> Self {
        Self {
            path: path.into(),
            cluster,
        }
    }
}

#[async_trait]
impl RegistrySource for FileRegistry {
    async fn resolve(&self) -> Result<RegistrySnapshot> {
        let json = tokio::fs::read_to_string(&self.path).await?;
        let snapshot = RegistrySnapshot::from_token_list_json(&json, self.cluster.chain_id())?;
        debug!(
            path = %self.path.display(),
            cluster = %self.cluster,
            tokens = snapshot.len(),
            "loaded token registry"
        );
        Ok(snapshot)
    }
}
