pub mod advanced;
pub mod basic;
pub mod config;
pub mod core;
pub mod error;
pub mod metadata;
pub mod types;
pub mod utils;

pub use crate::basic::discovery::{AccountDiscoveryService, Discovered};
pub use crate::basic::flow::{AssociatedAccountFlow, CreationState};
pub use crate::basic::session::{drive_pass, WalletSession};
pub use crate::basic::transfer::TransferOrchestrator;
pub use crate::config::SdkConfig;
pub use crate::core::cluster::Cluster;
pub use crate::core::connection::{LedgerConnection, RpcConnection};
pub use crate::core::signer::{KeypairSigner, WalletSigner};
pub use crate::error::{Result, SdkError, TransferError, TransitionError};
pub use crate::metadata::{
    EnrichmentPipeline, FileRegistry, MetadataSource, MetaplexMetadata, RegistrySnapshot,
    RegistrySource, StaticRegistry,
};
pub use crate::types::{
    AssetAccount, AssetDescriptor, CreationReceipt, RawTokenAccount, TransferReceipt,
    TransferRequest,
};
