// Example: Sending an asset, creating the receiver's token account if needed
//
// This example demonstrates how to:
// 1. Discover the sender's assets and select one by symbol
// 2. Attempt the transfer
// 3. Confirm creation of the receiver's token account when it is missing
// 4. Print the receipts with explorer links
//
// Usage: cargo run --example send_token -- <KEYPAIR.json> <SYMBOL> <RECEIVER> <AMOUNT>

use solana_sdk::signature::{read_keypair_file, Signer};
use solsend_sdk::{
    AccountDiscoveryService, FileRegistry, KeypairSigner, RegistrySnapshot, RpcConnection,
    SdkConfig, StaticRegistry, TransferError, TransferOrchestrator, WalletSession,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [keypair_path, symbol, receiver, amount] = args.as_slice() else {
        anyhow::bail!("usage: send_token <KEYPAIR.json> <SYMBOL> <RECEIVER> <AMOUNT>");
    };
    let amount: f64 = amount.parse()?;

    let keypair = read_keypair_file(keypair_path)
        .map_err(|e| anyhow::anyhow!("failed to read keypair: {}", e))?;
    let sender = keypair.pubkey();

    let config = SdkConfig::load(None)?;
    let connection = Arc::new(RpcConnection::from_config(&config));

    // 1. Discover and select
    let service = match &config.registry_path {
        Some(path) => {
            let registry = FileRegistry::new(path, config.cluster);
            AccountDiscoveryService::with_registry(Arc::clone(&connection), &registry).await
        },
        None => {
            let registry = StaticRegistry::new(RegistrySnapshot::default());
            AccountDiscoveryService::with_registry(Arc::clone(&connection), &registry).await
        },
    };
    let mut session = WalletSession::new();
    session.set_wallet(Some(sender));
    session.refresh(&service).await;

    let index = session
        .accounts()
        .iter()
        .position(|a| a.symbol.as_deref() == Some(symbol.as_str()) || a.label() == *symbol)
        .ok_or_else(|| anyhow::anyhow!("{} holds no asset named {}", sender, symbol))?;
    session.select(index);
    session.set_destination(receiver.clone());

    // 2. Transfer
    let orchestrator = TransferOrchestrator::new(connection, config.cluster)
        .with_wallet(Arc::new(KeypairSigner::new(keypair)));
    let request = session.transfer_request(amount);

    let receipt = match orchestrator.transfer(&request).await {
        Ok(receipt) => receipt,
        // 3. Receiver has no token account for this asset
        Err(TransferError::MissingDestinationAccount {
            owner,
            token_account,
        }) => {
            println!("{} has no token account for {}", owner, symbol);
            println!("Creating {} and resuming the transfer...", token_account);
            let receipt = orchestrator.confirm_account_creation().await?;
            if let Some(creation) = orchestrator.last_creation_receipt() {
                println!("Token account created: {}", creation.explorer_url);
            }
            receipt
        },
        Err(e) => return Err(e.into()),
    };

    // 4. Receipt
    println!("{}", receipt.summary());
    println!("  {}", receipt.explorer_url);

    Ok(())
}
