// Example: Listing the assets held by a wallet
//
// This example demonstrates how to:
// 1. Load the SDK configuration (file + environment)
// 2. Connect to the configured cluster
// 3. Load the token registry for that cluster
// 4. Stream a discovery pass into a wallet session
//
// Usage: cargo run --example list_assets -- <WALLET> [CONFIG.toml]

use solana_sdk::pubkey::Pubkey;
use solsend_sdk::{
    drive_pass, AccountDiscoveryService, FileRegistry, RegistrySnapshot, RpcConnection,
    SdkConfig, StaticRegistry, WalletSession,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let wallet = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: list_assets <WALLET> [CONFIG.toml]"))?;
    let wallet = Pubkey::from_str(&wallet)?;
    let config_path = args.next().map(PathBuf::from);

    // 1. Configuration
    let config = SdkConfig::load(config_path.as_deref())?;
    println!("Cluster: {} ({})", config.cluster, config.rpc_url());

    // 2. Connection
    let connection = Arc::new(RpcConnection::from_config(&config));

    // 3. Registry; without one, names come from on-ledger metadata only
    let service = match &config.registry_path {
        Some(path) => {
            let registry = FileRegistry::new(path, config.cluster);
            AccountDiscoveryService::with_registry(connection, &registry).await
        },
        None => {
            let registry = StaticRegistry::new(RegistrySnapshot::default());
            AccountDiscoveryService::with_registry(connection, &registry).await
        },
    };

    // 4. Discovery pass
    let session = Mutex::new(WalletSession::new());
    session.lock().await.set_wallet(Some(wallet));
    let found = drive_pass(&session, &service).await;

    println!("\n{} asset(s) held by {}:", found, wallet);
    for account in session.lock().await.accounts() {
        println!(
            "  {:<24} {:>20} {}",
            account.label(),
            account.balance,
            account.symbol.as_deref().unwrap_or("")
        );
        println!("    account: {}", account.owner_account_address);
        if let Some(icon) = &account.icon_uri {
            println!("    icon:    {}", icon);
        }
    }

    Ok(())
}
