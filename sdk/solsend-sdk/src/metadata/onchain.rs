use async_trait::async_trait;
use borsh::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

use crate::core::connection::LedgerConnection;
use crate::core::constants::METADATA_PROGRAM_ID;
use crate::error::{Result, SdkError};
use crate::utils;

/// Discriminator of a Metaplex `MetadataV1` account
const METADATA_V1_KEY: u8 = 4;

/// Name, symbol and URI stored on-ledger for a mint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

/// On-ledger metadata lookup keyed by the mint's derived metadata address
#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn resolve_metadata_address(&self, mint: &Pubkey) -> Pubkey;

    async fn load_metadata(&self, address: &Pubkey) -> Result<OnChainMetadata>;
}

/// Reads Metaplex token-metadata accounts through a ledger connection
pub struct MetaplexMetadata<C> {
    connection: Arc<C>,
}

impl<C: LedgerConnection> MetaplexMetadata<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl<C: LedgerConnection> MetadataSource for MetaplexMetadata<C> {
    fn resolve_metadata_address(&self, mint: &Pubkey) -> Pubkey {
        utils::derive_metadata_address(mint)
    }

    async fn load_metadata(&self, address: &Pubkey) -> Result<OnChainMetadata> {
        let account = self
            .connection
            .get_account(address)
            .await
            .map_err(|e| SdkError::Connection(e.to_string()))?
            .ok_or(SdkError::AccountNotFound(*address))?;

        if account.owner != METADATA_PROGRAM_ID {
            return Err(SdkError::InvalidAccountData(format!(
                "{} is not owned by the metadata program",
                address
            )));
        }

        decode_metadata(&account.data)
    }
}

/// Leading fields of a `MetadataV1` account. The remainder (creators,
/// collection, ...) is not needed and is left unread.
#[derive(BorshDeserialize)]
struct MetadataHeader {
    key: u8,
    _update_authority: [u8; 32],
    _mint: [u8; 32],
    name: String,
    symbol: String,
    uri: String,
}

/// Decode the name/symbol/uri prefix of a Metaplex metadata account.
/// Fixed-width fields are NUL padded on-ledger.
pub fn decode_metadata(data: &[u8]) -> Result<OnChainMetadata> {
    let header = MetadataHeader::deserialize(&mut &data[..])
        .map_err(|e| SdkError::InvalidAccountData(format!("metadata: {}", e)))?;

    if header.key != METADATA_V1_KEY {
        return Err(SdkError::InvalidAccountData(format!(
            "unexpected metadata key {}",
            header.key
        )));
    }

    Ok(OnChainMetadata {
        name: strip_padding(&header.name),
        symbol: strip_padding(&header.symbol),
        uri: strip_padding(&header.uri),
    })
}

fn strip_padding(s: &str) -> String {
    s.trim_end_matches('\0').trim().to_string()
}
