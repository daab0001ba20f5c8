use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_instruction;
use spl_associated_token_account::instruction::{
    create_associated_token_account, create_associated_token_account_idempotent,
};

use crate::error::TransferError;

/// Associated token account of `owner` for `mint`
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(owner, mint)
}

/// Creates a lamport transfer instruction
pub fn native_transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    system_instruction::transfer(from, to, lamports)
}

/// Creates an SPL token transfer of `amount` base units
///
/// # Arguments
/// * `source` - Sender token account
/// * `destination` - Receiver token account
/// * `authority` - Owner of `source` (signer)
/// * `amount` - Amount in base units (already scaled by the mint decimals)
pub fn token_transfer(
    source: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
) -> Result<Instruction, TransferError> {
    spl_token::instruction::transfer(
        &spl_token::id(),
        source,
        destination,
        authority,
        &[],
        amount,
    )
    .map_err(|e| TransferError::TransactionRejected(format!("token transfer: {}", e)))
}

/// Creates the associated token account of `owner` for `mint`, paid by `payer`
pub fn create_associated_account(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
    create_associated_token_account(payer, owner, mint, &spl_token::id())
}

/// Same as [`create_associated_account`] but succeeds if the account exists
pub fn create_associated_account_idempotent(
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    create_associated_token_account_idempotent(payer, owner, mint, &spl_token::id())
}
