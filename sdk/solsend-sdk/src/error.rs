use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::basic::flow::CreationState;

/// SDK-specific error types for ledger access and configuration
#[derive(Debug, Error)]
pub enum SdkError {
    /// Connection or RPC error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Account not found on-chain
    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    /// Invalid account data or deserialization error
    #[error("Invalid account data: {0}")]
    InvalidAccountData(String),

    /// Configuration could not be read or parsed
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Token registry snapshot could not be parsed
    #[error("Invalid token registry: {0}")]
    Registry(String),

    /// IO error while reading config or registry files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

/// Rejected move of the associated-account creation flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("illegal transition {from:?} -> {to:?}")]
    Illegal { from: CreationState, to: CreationState },

    /// The attempt was dismissed or replaced while the caller was suspended.
    #[error("attempt {attempt} is stale (current attempt is {current})")]
    StaleAttempt { attempt: u64, current: u64 },
}

/// Outcome kinds of a transfer attempt, surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransferError {
    #[error("No wallet connected")]
    NoWallet,

    #[error("No asset selected")]
    NoAssetSelected,

    #[error("Invalid amount {requested} (available {available})")]
    InvalidAmount { requested: f64, available: f64 },

    #[error("Invalid destination address: {0}")]
    InvalidDestination(String),

    /// The receiver has no token account for the asset; the creation flow
    /// has been initialized and the transfer is parked until it succeeds.
    #[error("Destination {owner} has no token account {token_account}")]
    MissingDestinationAccount { owner: Pubkey, token_account: Pubkey },

    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    /// The creation flow was dismissed while a transaction was in flight.
    #[error("Account creation dismissed")]
    Dismissed,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
}

impl TransferError {
    /// True when the failure is handled by the account creation flow rather
    /// than being terminal for the attempt.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TransferError::MissingDestinationAccount { .. })
    }

    /// True for validation failures caused by user input.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            TransferError::NoWallet
                | TransferError::NoAssetSelected
                | TransferError::InvalidAmount { .. }
                | TransferError::InvalidDestination(_)
        )
    }
}
