use futures::StreamExt;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::basic::discovery::{AccountDiscoveryService, Discovered};
use crate::core::connection::LedgerConnection;
use crate::types::{AssetAccount, TransferRequest};

/// Session-scoped view of the connected wallet: the discovered accounts,
/// the selection and the typed destination.
///
/// Each discovery pass runs under a generation id. Changing the wallet (or
/// starting a new pass) bumps the generation and clears the collection, so
/// late arrivals from an earlier pass are discarded by [`accept`].
///
/// [`accept`]: WalletSession::accept
#[derive(Debug, Default)]
pub struct WalletSession {
    wallet: Option<Pubkey>,
    generation: u64,
    accounts: Vec<AssetAccount>,
    selected: Option<usize>,
    destination: String,
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wallet(&self) -> Option<Pubkey> {
        self.wallet
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Switch the active wallet. Everything derived from the previous one is
    /// dropped. Returns the generation of the new session state.
    pub fn set_wallet(&mut self, wallet: Option<Pubkey>) -> u64 {
        if wallet == self.wallet {
            return self.generation;
        }
        info!(?wallet, "active wallet changed");
        self.wallet = wallet;
        self.destination.clear();
        self.begin_pass()
    }

    /// Start a new pass for the current wallet
    pub fn begin_pass(&mut self) -> u64 {
        self.generation += 1;
        self.accounts.clear();
        self.selected = None;
        self.generation
    }

    /// Merge one discovered account. Returns false if it belongs to a stale
    /// pass or another wallet.
    pub fn accept(&mut self, item: Discovered) -> bool {
        if item.generation != self.generation || Some(item.wallet) != self.wallet {
            debug!(
                generation = item.generation,
                current = self.generation,
                wallet = %item.wallet,
                "discarding stale discovery result"
            );
            return false;
        }

        let existing = self
            .accounts
            .iter()
            .position(|a| a.key() == item.account.key());
        match existing {
            Some(index) => self.accounts[index] = item.account,
            None => self.accounts.push(item.account),
        }
        true
    }

    pub fn accounts(&self) -> &[AssetAccount] {
        &self.accounts
    }

    pub fn select(&mut self, index: usize) -> Option<&AssetAccount> {
        self.selected = (index < self.accounts.len()).then_some(index);
        self.selected()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&AssetAccount> {
        self.selected.and_then(|i| self.accounts.get(i))
    }

    pub fn set_destination(&mut self, destination: impl Into<String>) {
        self.destination = destination.into();
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Request built from the current selection and destination
    pub fn transfer_request(&self, amount: f64) -> TransferRequest {
        TransferRequest {
            source: self.selected().cloned(),
            destination_address: self.destination.clone(),
            amount,
        }
    }

    /// Run a full pass for the current wallet while holding the session
    pub async fn refresh<C: LedgerConnection>(
        &mut self,
        service: &AccountDiscoveryService<C>,
    ) -> usize {
        let Some(wallet) = self.wallet else {
            return 0;
        };
        let generation = self.begin_pass();
        let mut stream = service.discover(wallet, generation);
        let mut accepted = 0;
        while let Some(item) = stream.next().await {
            if self.accept(item) {
                accepted += 1;
            }
        }
        accepted
    }
}

/// Run a pass against a shared session. The lock is taken per arrival, so
/// the wallet may change while the pass is running; results of the
/// superseded pass are then discarded.
pub async fn drive_pass<C: LedgerConnection>(
    session: &Mutex<WalletSession>,
    service: &AccountDiscoveryService<C>,
) -> usize {
    let (wallet, generation) = {
        let mut guard = session.lock().await;
        let Some(wallet) = guard.wallet() else {
            return 0;
        };
        (wallet, guard.begin_pass())
    };

    let mut stream = service.discover(wallet, generation);
    let mut accepted = 0;
    while let Some(item) = stream.next().await {
        if session.lock().await.accept(item) {
            accepted += 1;
        }
    }
    accepted
}
