use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::advanced::instructions;
use crate::basic::flow::{AssociatedAccountFlow, CreationState};
use crate::core::cluster::Cluster;
use crate::core::connection::LedgerConnection;
use crate::core::constants::NATIVE_DECIMALS;
use crate::core::signer::WalletSigner;
use crate::error::{TransferError, TransitionError};
use crate::types::{AssetAccount, CreationReceipt, TransferReceipt, TransferRequest};
use crate::utils;

/// Request that passed validation
struct Validated {
    signer: Arc<dyn WalletSigner>,
    source: AssetAccount,
    destination: Pubkey,
    amount: f64,
}

/// Token transfer waiting for the receiver's token account to be created
#[derive(Debug, Clone)]
struct ParkedTransfer {
    attempt: u64,
    source: AssetAccount,
    sender: Pubkey,
    mint: Pubkey,
    destination: Pubkey,
    destination_account: Pubkey,
    /// Instructions preceding the transfer (lazy creation of the sender account)
    prelude: Vec<Instruction>,
    source_account: Pubkey,
    amount: f64,
    base_units: u64,
}

impl ParkedTransfer {
    fn instructions(&self) -> Result<Vec<Instruction>, TransferError> {
        let mut ixs = self.prelude.clone();
        ixs.push(instructions::token_transfer(
            &self.source_account,
            &self.destination_account,
            &self.sender,
            self.base_units,
        )?);
        Ok(ixs)
    }
}

/// Drives a transfer from validation to confirmation, detouring through
/// [`AssociatedAccountFlow`] when the receiver lacks a token account.
pub struct TransferOrchestrator<C> {
    connection: Arc<C>,
    wallet: Option<Arc<dyn WalletSigner>>,
    cluster: Cluster,
    flow: AssociatedAccountFlow,
    parked: Mutex<Option<ParkedTransfer>>,
    last_creation: Mutex<Option<CreationReceipt>>,
}

impl<C: LedgerConnection> TransferOrchestrator<C> {
    pub fn new(connection: Arc<C>, cluster: Cluster) -> Self {
        Self {
            connection,
            wallet: None,
            cluster,
            flow: AssociatedAccountFlow::new(),
            parked: Mutex::new(None),
            last_creation: Mutex::new(None),
        }
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn WalletSigner>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Connect or disconnect the wallet. Any creation flow in progress is
    /// dismissed.
    pub fn set_wallet(&mut self, wallet: Option<Arc<dyn WalletSigner>>) {
        self.wallet = wallet;
        self.dismiss();
    }

    pub fn wallet(&self) -> Option<Pubkey> {
        self.wallet.as_ref().map(|w| w.pubkey())
    }

    pub fn creation_state(&self) -> CreationState {
        self.flow.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<CreationState> {
        self.flow.subscribe()
    }

    /// Whether the "create account" affordance may be enabled
    pub fn can_confirm(&self) -> bool {
        self.flow.state().accepts_confirmation()
    }

    /// Receiver owner and token account of the parked transfer
    pub fn pending_destination(&self) -> Option<(Pubkey, Pubkey)> {
        lock(&self.parked)
            .as_ref()
            .map(|p| (p.destination, p.destination_account))
    }

    pub fn last_creation_receipt(&self) -> Option<CreationReceipt> {
        lock(&self.last_creation).clone()
    }

    /// Attempt a transfer.
    ///
    /// Validation order: wallet, selection, amount, destination. An invalid
    /// amount does not stop the destination check, but nothing is submitted
    /// unless both pass. When the receiver has no token account for the
    /// asset the request is parked, the creation flow moves to
    /// `Initialized` and `MissingDestinationAccount` is returned.
    pub async fn transfer(&self, request: &TransferRequest) -> Result<TransferReceipt, TransferError> {
        let attempt = self.flow.reset();
        lock(&self.parked).take();

        let validated = self.validate(request)?;
        if validated.source.is_native() {
            self.send_native(validated).await
        } else {
            self.send_token(validated, attempt).await
        }
    }

    /// User confirmed creation of the receiver's token account. Submits the
    /// creation transaction and, once confirmed, resumes the parked transfer.
    pub async fn confirm_account_creation(&self) -> Result<TransferReceipt, TransferError> {
        let signer = self.wallet.clone().ok_or(TransferError::NoWallet)?;
        let attempt = self.flow.begin_creation()?;
        let parked = match lock(&self.parked).clone() {
            Some(parked) if parked.attempt == attempt => parked,
            _ => return Err(TransferError::Dismissed),
        };

        let ix = instructions::create_associated_account(
            &signer.pubkey(),
            &parked.destination,
            &parked.mint,
        );
        let signature = match self.submit(&signer, vec![ix]).await {
            Ok(signature) => signature,
            Err(e) => {
                warn!(owner = %parked.destination, error = %e, "token account creation failed");
                self.settle(attempt, |flow| flow.creation_failed(attempt));
                self.release(attempt);
                return Err(e);
            },
        };

        *lock(&self.last_creation) = Some(CreationReceipt {
            signature,
            explorer_url: self.cluster.explorer_tx_url(&signature),
            owner: parked.destination,
            token_account: parked.destination_account,
        });

        if self.flow.creation_confirmed(attempt).is_err() {
            info!(%signature, "token account created after dismissal, not resuming transfer");
            return Err(TransferError::Dismissed);
        }

        info!(token_account = %parked.destination_account, "resuming parked transfer");
        let result = self.resume(&signer, &parked).await;
        self.release(attempt);
        let receipt = result?;
        self.settle(attempt, |flow| flow.complete(attempt));
        Ok(receipt)
    }

    /// Dismiss the creation flow. A creation transaction already submitted
    /// is not rolled back; its result is ignored.
    pub fn dismiss(&self) {
        if self.flow.state() != CreationState::NotInitiated {
            self.flow.dismiss();
        }
        lock(&self.parked).take();
    }

    fn validate(&self, request: &TransferRequest) -> Result<Validated, TransferError> {
        let signer = self.wallet.clone().ok_or(TransferError::NoWallet)?;
        let source = request
            .source
            .clone()
            .ok_or(TransferError::NoAssetSelected)?;

        // Not short-circuiting: the destination is still checked
        let amount_ok = request.amount > 0.0 && request.amount <= source.balance;
        if !amount_ok {
            debug!(
                requested = request.amount,
                available = source.balance,
                "amount exceeds balance"
            );
        }

        let destination = utils::parse_address(&request.destination_address)
            .ok_or_else(|| TransferError::InvalidDestination(request.destination_address.clone()))?;

        if !amount_ok {
            return Err(TransferError::InvalidAmount {
                requested: request.amount,
                available: source.balance,
            });
        }

        Ok(Validated {
            signer,
            source,
            destination,
            amount: request.amount,
        })
    }

    async fn send_native(&self, v: Validated) -> Result<TransferReceipt, TransferError> {
        let lamports = utils::to_base_units(v.amount, NATIVE_DECIMALS).ok_or(
            TransferError::InvalidAmount {
                requested: v.amount,
                available: v.source.balance,
            },
        )?;

        let ix = instructions::native_transfer(&v.signer.pubkey(), &v.destination, lamports);
        let signature = self.submit(&v.signer, vec![ix]).await?;
        Ok(self.receipt(signature, &v.source, v.amount, v.destination))
    }

    async fn send_token(&self, v: Validated, attempt: u64) -> Result<TransferReceipt, TransferError> {
        let mint = v.source.mint().ok_or(TransferError::NoAssetSelected)?;
        let base_units = utils::to_base_units(v.amount, v.source.decimal_places).ok_or(
            TransferError::InvalidAmount {
                requested: v.amount,
                available: v.source.balance,
            },
        )?;
        let sender = v.signer.pubkey();

        let mut prelude = Vec::new();
        let source_account = self
            .resolve_source_account(&sender, &mint, &v.source, &mut prelude)
            .await?;
        let destination_account = instructions::associated_token_address(&v.destination, &mint);

        let parked = ParkedTransfer {
            attempt,
            source: v.source,
            sender,
            mint,
            destination: v.destination,
            destination_account,
            prelude,
            source_account,
            amount: v.amount,
            base_units,
        };

        if !self.account_exists(&destination_account).await? {
            info!(
                owner = %parked.destination,
                token_account = %destination_account,
                %mint,
                "receiver has no token account, awaiting creation"
            );
            *lock(&self.parked) = Some(parked);
            self.flow.initialize()?;
            return Err(TransferError::MissingDestinationAccount {
                owner: v.destination,
                token_account: destination_account,
            });
        }

        self.resume(&v.signer, &parked).await
    }

    async fn resume(
        &self,
        signer: &Arc<dyn WalletSigner>,
        parked: &ParkedTransfer,
    ) -> Result<TransferReceipt, TransferError> {
        let signature = self.submit(signer, parked.instructions()?).await?;
        Ok(self.receipt(signature, &parked.source, parked.amount, parked.destination))
    }

    /// Sender ATA when it exists, else the discovered holding account, else
    /// the ATA created lazily in the same transaction.
    async fn resolve_source_account(
        &self,
        sender: &Pubkey,
        mint: &Pubkey,
        source: &AssetAccount,
        prelude: &mut Vec<Instruction>,
    ) -> Result<Pubkey, TransferError> {
        let sender_ata = instructions::associated_token_address(sender, mint);
        if self.account_exists(&sender_ata).await? {
            return Ok(sender_ata);
        }
        if source.owner_account_address != *sender {
            return Ok(source.owner_account_address);
        }
        debug!(%sender_ata, "creating sender token account");
        prelude.push(instructions::create_associated_account_idempotent(
            sender, sender, mint,
        ));
        Ok(sender_ata)
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, TransferError> {
        self.connection
            .get_account(address)
            .await
            .map(|account| account.is_some())
            .map_err(|e| TransferError::Connection(e.to_string()))
    }

    async fn submit(
        &self,
        signer: &Arc<dyn WalletSigner>,
        ixs: Vec<Instruction>,
    ) -> Result<Signature, TransferError> {
        let blockhash = self
            .connection
            .get_latest_blockhash()
            .await
            .map_err(|e| TransferError::Connection(e.to_string()))?;

        let payer = signer.pubkey();
        let mut tx = Transaction::new_with_payer(&ixs, Some(&payer));
        signer
            .sign_transaction(&mut tx, blockhash)
            .await
            .map_err(TransferError::TransactionRejected)?;

        let signature = self.connection.send_transaction(&tx).await.map_err(|e| {
            warn!(error = %e, "transaction rejected");
            TransferError::TransactionRejected(e.to_string())
        })?;
        info!(%signature, instructions = ixs.len(), "transaction confirmed");
        Ok(signature)
    }

    fn receipt(
        &self,
        signature: Signature,
        source: &AssetAccount,
        amount: f64,
        destination: Pubkey,
    ) -> TransferReceipt {
        TransferReceipt {
            signature,
            explorer_url: self.cluster.explorer_tx_url(&signature),
            amount,
            asset_label: source.symbol.clone().unwrap_or_else(|| source.label()),
            destination,
        }
    }

    /// Apply a closing transition; a dismissed attempt is left alone
    fn settle<F>(&self, attempt: u64, transition: F)
    where
        F: FnOnce(&AssociatedAccountFlow) -> Result<(), TransitionError>,
    {
        if let Err(e) = transition(&self.flow) {
            debug!(attempt, error = %e, "transition skipped");
        }
    }

    /// Drop the parked transfer if it still belongs to `attempt`
    fn release(&self, attempt: u64) {
        let mut parked = lock(&self.parked);
        if parked.as_ref().map(|p| p.attempt) == Some(attempt) {
            parked.take();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
