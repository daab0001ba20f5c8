use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::pubkey::Pubkey;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::{Account as TokenAccount, Mint};
use std::str::FromStr;

use crate::core::constants::{
    LABEL_PREFIX_LEN, METADATA_PROGRAM_ID, METADATA_SEED, TOKEN_ACCOUNT_LEN,
    TOKEN_ACCOUNT_OWNER_OFFSET,
};
use crate::error::{Result, SdkError};
use crate::types::RawTokenAccount;

//=============================================================================
// Amount Conversion
//=============================================================================

/// Convert an on-ledger amount to human units
pub fn to_ui_amount(raw: u64, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

/// Convert a human amount to on-ledger base units.
/// Returns None for negative, non-finite or overflowing values.
pub fn to_base_units(amount: f64, decimals: u8) -> Option<u64> {
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    let scaled = (amount * 10f64.powi(decimals as i32)).round();
    if scaled > u64::MAX as f64 {
        return None;
    }
    Some(scaled as u64)
}

//=============================================================================
// Addresses & Labels
//=============================================================================

/// The ledger's address validity predicate
pub fn parse_address(address: &str) -> Option<Pubkey> {
    Pubkey::from_str(address.trim()).ok()
}

/// `Token-<first chars of mint>` for assets without a display name
pub fn fallback_label(asset_identifier: &str) -> String {
    let prefix: String = asset_identifier.chars().take(LABEL_PREFIX_LEN).collect();
    format!("Token-{}", prefix)
}

/// Derive the Metaplex metadata PDA of a mint
pub fn derive_metadata_address(mint: &Pubkey) -> Pubkey {
    let (pda, _) = Pubkey::find_program_address(
        &[METADATA_SEED, METADATA_PROGRAM_ID.as_ref(), mint.as_ref()],
        &METADATA_PROGRAM_ID,
    );
    pda
}

//=============================================================================
// Token Account Scan
//=============================================================================

/// Ledger-side filters selecting the token accounts owned by `wallet`
pub fn token_account_filters(wallet: &Pubkey) -> Vec<RpcFilterType> {
    vec![
        RpcFilterType::DataSize(TOKEN_ACCOUNT_LEN),
        RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
            TOKEN_ACCOUNT_OWNER_OFFSET,
            wallet.as_ref(),
        )),
    ]
}

/// Decode an SPL token account. Decimals are left unset; they live on the mint.
pub fn decode_token_account(address: Pubkey, data: &[u8]) -> Result<RawTokenAccount> {
    let account = TokenAccount::unpack(data).map_err(|e| {
        SdkError::InvalidAccountData(format!("token account {}: {:?}", address, e))
    })?;

    Ok(RawTokenAccount {
        address,
        mint: account.mint,
        owner: account.owner,
        amount: account.amount,
        decimals: None,
    })
}

/// Decimals of an SPL mint account
pub fn decode_mint_decimals(data: &[u8]) -> Result<u8> {
    let mint = Mint::unpack(data)
        .map_err(|e| SdkError::InvalidAccountData(format!("mint: {:?}", e)))?;
    Ok(mint.decimals)
}
