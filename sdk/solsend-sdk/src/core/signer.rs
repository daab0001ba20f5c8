use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;

/// Abstraction for the connected wallet.
/// This allows the SDK to work with:
/// 1. Local Keypairs (Backend/CLI)
/// 2. Wallet Adapters (Frontend - the user approves each transaction)
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Sign `tx` (fee payer = `pubkey()`) against `recent_blockhash`.
    /// Returns Err when the user declines or signing fails.
    async fn sign_transaction(
        &self,
        tx: &mut Transaction,
        recent_blockhash: Hash,
    ) -> Result<(), String>;
}

/// Wallet backed by an in-process keypair
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

#[async_trait]
impl WalletSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        tx: &mut Transaction,
        recent_blockhash: Hash,
    ) -> Result<(), String> {
        tx.try_sign(&[&self.keypair], recent_blockhash)
            .map_err(|e| e.to_string())
    }
}
