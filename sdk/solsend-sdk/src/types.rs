use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::core::constants::{NATIVE_DECIMALS, NATIVE_NAME, NATIVE_SYMBOL, SOLANA_LOGO_URI};
use crate::utils;

/// One holding of the wallet on the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAccount {
    /// Account holding the balance: the wallet itself for SOL, the token account otherwise
    pub owner_account_address: Pubkey,

    /// Mint address, empty for the native asset
    pub asset_identifier: String,

    /// Balance in human units
    pub balance: f64,

    /// Undivided on-ledger amount
    pub raw_amount: u64,

    pub decimal_places: u8,

    pub display_name: Option<String>,
    pub symbol: Option<String>,
    pub icon_uri: Option<String>,
}

impl AssetAccount {
    /// SOL entry of `wallet`, built from its lamport balance
    pub fn native(wallet: Pubkey, lamports: u64) -> Self {
        Self {
            owner_account_address: wallet,
            asset_identifier: String::new(),
            balance: utils::to_ui_amount(lamports, NATIVE_DECIMALS),
            raw_amount: lamports,
            decimal_places: NATIVE_DECIMALS,
            display_name: Some(NATIVE_NAME.to_string()),
            symbol: Some(NATIVE_SYMBOL.to_string()),
            icon_uri: Some(SOLANA_LOGO_URI.to_string()),
        }
    }

    pub fn is_native(&self) -> bool {
        self.asset_identifier.is_empty()
    }

    /// Mint of a token holding; None for SOL or an unparsable identifier
    pub fn mint(&self) -> Option<Pubkey> {
        if self.is_native() {
            return None;
        }
        self.asset_identifier.parse().ok()
    }

    /// Name shown to the user, falling back to a truncated mint
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => utils::fallback_label(&self.asset_identifier),
        }
    }

    /// Key identifying the holding within one discovery pass
    pub fn key(&self) -> (Pubkey, &str) {
        (self.owner_account_address, self.asset_identifier.as_str())
    }
}

/// Display data of a mint merged from the metadata providers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub display_name: Option<String>,
    pub symbol: Option<String>,
    pub icon_uri: Option<String>,
    pub decimal_places: u8,
}

/// SPL token account as decoded from the program-account scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTokenAccount {
    pub address: Pubkey,
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,

    /// Read from the mint account; None if the mint could not be loaded
    pub decimals: Option<u8>,
}

/// Request to move `amount` (human units) of `source` to `destination_address`
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub source: Option<AssetAccount>,
    pub destination_address: String,
    pub amount: f64,
}

impl TransferRequest {
    pub fn new(source: AssetAccount, destination_address: impl Into<String>, amount: f64) -> Self {
        Self {
            source: Some(source),
            destination_address: destination_address.into(),
            amount,
        }
    }
}

/// Result of a submitted transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub signature: Signature,
    pub explorer_url: String,
    pub amount: f64,
    pub asset_label: String,
    pub destination: Pubkey,
}

impl TransferReceipt {
    pub fn summary(&self) -> String {
        format!(
            "Successfully transferred {} {} to {}",
            self.amount, self.asset_label, self.destination
        )
    }
}

/// Result of the receiver token-account creation transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationReceipt {
    pub signature: Signature,
    pub explorer_url: String,
    pub owner: Pubkey,
    pub token_account: Pubkey,
}
