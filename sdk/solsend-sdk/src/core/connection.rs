use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::RpcFilterType;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::error::Error;

use crate::config::SdkConfig;

/// Ledger RPC surface the SDK consumes. Retries and backoff belong to the
/// implementation, not to the callers.
#[async_trait]
pub trait LedgerConnection: Send + Sync {
    /// Lamport balance of `pubkey`
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// All accounts owned by `program_id` matching every filter. Filtering
    /// happens on the ledger side.
    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> Result<Vec<(Pubkey, Account)>, Box<dyn Error + Send + Sync>>;

    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, Box<dyn Error + Send + Sync>>;

    async fn get_latest_blockhash(&self) -> Result<Hash, Box<dyn Error + Send + Sync>>;

    /// Submit a signed transaction and wait until it is confirmed
    async fn send_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<Signature, Box<dyn Error + Send + Sync>>;
}

/// `LedgerConnection` backed by the nonblocking JSON-RPC client.
pub struct RpcConnection {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcConnection {
    pub fn new(url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url.into(), commitment),
            commitment,
        }
    }

    pub fn from_config(config: &SdkConfig) -> Self {
        Self::new(config.rpc_url(), config.commitment_config())
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

#[async_trait]
impl LedgerConnection for RpcConnection {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, Box<dyn Error + Send + Sync>> {
        Ok(self.client.get_balance(pubkey).await?)
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> Result<Vec<(Pubkey, Account)>, Box<dyn Error + Send + Sync>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..Default::default()
            },
            ..Default::default()
        };
        Ok(self
            .client
            .get_program_accounts_with_config(program_id, config)
            .await?)
    }

    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, Box<dyn Error + Send + Sync>> {
        let response = self
            .client
            .get_account_with_commitment(pubkey, self.commitment)
            .await?;
        Ok(response.value)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, Box<dyn Error + Send + Sync>> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn send_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<Signature, Box<dyn Error + Send + Sync>> {
        Ok(self.client.send_and_confirm_transaction(tx).await?)
    }
}
