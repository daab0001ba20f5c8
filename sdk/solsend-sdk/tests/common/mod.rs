#![allow(dead_code)]

use async_trait::async_trait;
use solana_client::rpc_filter::RpcFilterType;
use solana_sdk::{
    account::Account,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use solsend_sdk::{
    core::constants::METADATA_PROGRAM_ID, utils, KeypairSigner, LedgerConnection, WalletSigner,
};
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::{Account as TokenAccount, AccountState, Mint};
use std::collections::{HashMap, HashSet, VecDeque};
use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

type BoxError = Box<dyn Error + Send + Sync>;

/// In-memory ledger implementing the SDK connection.
///
/// Program-account queries apply the filters the way the RPC node does.
/// Submitted transactions are recorded; associated-account creation
/// instructions materialize the created token account.
#[derive(Default)]
pub struct MockLedger {
    accounts: Mutex<HashMap<Pubkey, Account>>,
    balances: Mutex<HashMap<Pubkey, u64>>,
    sent: Mutex<Vec<Transaction>>,
    send_outcomes: Mutex<VecDeque<Option<String>>>,
    send_gate: Mutex<Option<Arc<Notify>>>,
    failing_reads: Mutex<HashSet<Pubkey>>,
    pub fail_balance: AtomicBool,
    pub fail_program_accounts: AtomicBool,
    calls: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_balance(&self, wallet: Pubkey, lamports: u64) {
        self.balances.lock().unwrap().insert(wallet, lamports);
    }

    pub fn set_account(&self, address: Pubkey, account: Account) {
        self.accounts.lock().unwrap().insert(address, account);
    }

    /// Create an initialized mint with `decimals`
    pub fn add_mint(&self, decimals: u8) -> Pubkey {
        let mint = Pubkey::new_unique();
        let state = Mint {
            decimals,
            is_initialized: true,
            supply: u64::MAX / 2,
            ..Default::default()
        };
        let mut data = vec![0u8; Mint::LEN];
        Mint::pack(state, &mut data).unwrap();
        self.set_account(mint, program_account(spl_token::id(), data));
        mint
    }

    /// Create a token account of `owner` at `address`
    pub fn add_token_account_at(&self, address: Pubkey, owner: Pubkey, mint: Pubkey, amount: u64) {
        let state = TokenAccount {
            mint,
            owner,
            amount,
            state: AccountState::Initialized,
            ..Default::default()
        };
        let mut data = vec![0u8; TokenAccount::LEN];
        TokenAccount::pack(state, &mut data).unwrap();
        self.set_account(address, program_account(spl_token::id(), data));
    }

    /// Create the associated token account of `owner` for `mint`
    pub fn add_associated_account(&self, owner: Pubkey, mint: Pubkey, amount: u64) -> Pubkey {
        let address = spl_associated_token_account::get_associated_token_address(&owner, &mint);
        self.add_token_account_at(address, owner, mint, amount);
        address
    }

    pub fn add_metadata(&self, mint: &Pubkey, name: &str, symbol: &str, uri: &str) {
        self.set_account(
            utils::derive_metadata_address(mint),
            program_account(METADATA_PROGRAM_ID, encode_metadata(name, symbol, uri)),
        );
    }

    /// Reads of `address` fail with a transport error
    pub fn fail_reads_of(&self, address: Pubkey) {
        self.failing_reads.lock().unwrap().insert(address);
    }

    /// Queue a rejection with `reason` for the next submission
    pub fn reject_next_send(&self, reason: &str) {
        self.send_outcomes
            .lock()
            .unwrap()
            .push_back(Some(reason.to_string()));
    }

    /// Queue a success, so a rejection queued after it hits a later submission
    pub fn accept_next_send(&self) {
        self.send_outcomes.lock().unwrap().push_back(None);
    }

    /// The next submission is recorded, then stays in flight until the
    /// returned handle is notified.
    pub fn hold_next_send(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.send_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of ledger calls of any kind
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn materialize(&self, tx: &Transaction) {
        let keys = &tx.message.account_keys;
        for ix in &tx.message.instructions {
            if keys[ix.program_id_index as usize] != spl_associated_token_account::id() {
                continue;
            }
            // [payer, associated account, owner, mint, ...]
            let account = |i: usize| keys[ix.accounts[i] as usize];
            if !self.accounts.lock().unwrap().contains_key(&account(1)) {
                self.add_token_account_at(account(1), account(2), account(3), 0);
            }
        }
    }
}

#[async_trait]
impl LedgerConnection for MockLedger {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, BoxError> {
        self.touch();
        if self.fail_balance.load(Ordering::SeqCst) {
            return Err("balance unavailable".into());
        }
        Ok(self.balances.lock().unwrap().get(pubkey).copied().unwrap_or(0))
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> Result<Vec<(Pubkey, Account)>, BoxError> {
        self.touch();
        if self.fail_program_accounts.load(Ordering::SeqCst) {
            return Err("program accounts unavailable".into());
        }
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .iter()
            .filter(|(_, account)| account.owner == *program_id)
            .filter(|(_, account)| {
                filters.iter().all(|filter| match filter {
                    RpcFilterType::DataSize(size) => account.data.len() as u64 == *size,
                    RpcFilterType::Memcmp(memcmp) => memcmp.bytes_match(&account.data),
                    _ => true,
                })
            })
            .map(|(address, account)| (*address, account.clone()))
            .collect())
    }

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, BoxError> {
        self.touch();
        if self.failing_reads.lock().unwrap().contains(pubkey) {
            return Err(format!("read of {} failed", pubkey).into());
        }
        Ok(self.accounts.lock().unwrap().get(pubkey).cloned())
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, BoxError> {
        self.touch();
        Ok(Hash::new_unique())
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, BoxError> {
        self.touch();
        self.sent.lock().unwrap().push(tx.clone());
        let gate = self.send_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let outcome = self.send_outcomes.lock().unwrap().pop_front();
        if let Some(Some(reason)) = outcome {
            return Err(reason.into());
        }
        tx.verify().map_err(|e| Box::new(e) as BoxError)?;
        self.materialize(tx);
        Ok(tx.signatures[0])
    }
}

pub fn program_account(owner: Pubkey, data: Vec<u8>) -> Account {
    Account {
        lamports: 1_000_000,
        data,
        owner,
        executable: false,
        rent_epoch: 0,
    }
}

/// Metaplex `MetadataV1` account bytes with NUL-padded strings
pub fn encode_metadata(name: &str, symbol: &str, uri: &str) -> Vec<u8> {
    fn push_str(buf: &mut Vec<u8>, s: &str, width: usize) {
        let mut bytes = s.as_bytes().to_vec();
        bytes.resize(width, 0);
        buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        buf.extend_from_slice(&bytes);
    }

    let mut buf = vec![4u8];
    buf.extend_from_slice(&[1u8; 32]);
    buf.extend_from_slice(&[2u8; 32]);
    push_str(&mut buf, name, 32);
    push_str(&mut buf, symbol, 10);
    push_str(&mut buf, uri, 200);
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.push(0);
    buf
}

pub fn wallet() -> (Pubkey, Arc<dyn WalletSigner>) {
    let keypair = Keypair::new();
    let pubkey = keypair.pubkey();
    (pubkey, Arc::new(KeypairSigner::new(keypair)))
}

/// Wallet adapter whose user declines every signature request
pub struct DecliningSigner(pub Pubkey);

#[async_trait]
impl WalletSigner for DecliningSigner {
    fn pubkey(&self) -> Pubkey {
        self.0
    }

    async fn sign_transaction(&self, _tx: &mut Transaction, _blockhash: Hash) -> Result<(), String> {
        Err("User rejected the request".to_string())
    }
}
