//! Merge of on-ledger metadata and the static registry into display data.
//!
//! Per-field precedence:
//!
//! | field            | on-ledger metadata | registry              |
//! |------------------|--------------------|-----------------------|
//! | `display_name`   | wins               | fills only if unset   |
//! | `symbol`         | sets               | overwrites            |
//! | `icon_uri`       | sets (uri)         | overwrites if present |
//! | `decimal_places` | -                  | overwrites            |

use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::SdkError;
use crate::metadata::onchain::{MetadataSource, OnChainMetadata};
use crate::metadata::registry::{RegistryEntry, RegistrySnapshot};
use crate::types::{AssetAccount, AssetDescriptor, RawTokenAccount};
use crate::utils;

impl AssetDescriptor {
    /// Descriptor before any lookup: only the mint's own decimals are known
    pub fn from_raw(raw: &RawTokenAccount) -> Self {
        Self {
            decimal_places: raw.decimals.unwrap_or(0),
            ..Default::default()
        }
    }

    /// First pass: adopt name, symbol and uri from on-ledger metadata
    pub fn with_onchain(self, meta: &OnChainMetadata) -> Self {
        Self {
            display_name: non_empty(&meta.name).or(self.display_name),
            symbol: non_empty(&meta.symbol).or(self.symbol),
            icon_uri: non_empty(&meta.uri).or(self.icon_uri),
            decimal_places: self.decimal_places,
        }
    }

    /// Second pass: the registry is authoritative for decimals and symbol
    pub fn with_registry(self, entry: &RegistryEntry) -> Self {
        Self {
            display_name: self.display_name.or_else(|| non_empty(&entry.name)),
            symbol: Some(entry.symbol.clone()),
            icon_uri: entry.logo_uri.clone().or(self.icon_uri),
            decimal_places: entry.decimals,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Pure merge of a raw token account with whatever the two lookups returned.
///
/// Returns None when neither the mint nor the registry gives a decimal
/// scale: the balance cannot be expressed in human units then.
pub fn merge(
    raw: &RawTokenAccount,
    onchain: Option<&OnChainMetadata>,
    registry: Option<&RegistryEntry>,
) -> Option<AssetAccount> {
    let balance_decimals = raw.decimals.or(registry.map(|entry| entry.decimals))?;

    let mut descriptor = AssetDescriptor::from_raw(raw);
    if let Some(meta) = onchain {
        descriptor = descriptor.with_onchain(meta);
    }
    if let Some(entry) = registry {
        descriptor = descriptor.with_registry(entry);
    }

    // The balance is scaled by the mint's own decimals when they are known
    Some(AssetAccount {
        owner_account_address: raw.address,
        asset_identifier: raw.mint.to_string(),
        balance: utils::to_ui_amount(raw.amount, balance_decimals),
        raw_amount: raw.amount,
        decimal_places: descriptor.decimal_places,
        display_name: descriptor.display_name,
        symbol: descriptor.symbol,
        icon_uri: descriptor.icon_uri,
    })
}

/// Attaches display metadata to raw token accounts. A metadata lookup error
/// only leaves the display fields unset; an account whose decimal scale is
/// unknown is dropped.
#[derive(Clone)]
pub struct EnrichmentPipeline {
    metadata: Arc<dyn MetadataSource>,
    registry: Arc<RegistrySnapshot>,
}

impl EnrichmentPipeline {
    pub fn new(metadata: Arc<dyn MetadataSource>, registry: Arc<RegistrySnapshot>) -> Self {
        Self { metadata, registry }
    }

    pub async fn enrich(&self, raw: &RawTokenAccount) -> Option<AssetAccount> {
        let onchain = self.lookup_onchain(&raw.mint).await;
        let registry = self.registry.get(&raw.mint.to_string());
        let account = merge(raw, onchain.as_ref(), registry);
        if account.is_none() {
            warn!(
                address = %raw.address,
                mint = %raw.mint,
                "decimals unknown, skipping token account"
            );
        }
        account
    }

    async fn lookup_onchain(&self, mint: &Pubkey) -> Option<OnChainMetadata> {
        let address = self.metadata.resolve_metadata_address(mint);
        match self.metadata.load_metadata(&address).await {
            Ok(meta) => Some(meta),
            Err(SdkError::AccountNotFound(_)) => {
                debug!(%mint, "no on-ledger metadata");
                None
            },
            Err(e) => {
                warn!(%mint, error = %e, "on-ledger metadata lookup failed");
                None
            },
        }
    }
}
