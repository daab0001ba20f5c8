use futures::StreamExt;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solsend_sdk::{
    core::constants::{NATIVE_SYMBOL, SOLANA_LOGO_URI},
    drive_pass,
    metadata::RegistryEntry,
    AccountDiscoveryService, AssetAccount, RegistrySnapshot, StaticRegistry, WalletSession,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::Mutex;

mod common;
use common::MockLedger;

//=============================================================================
// Test Helpers
//=============================================================================

async fn service(
    ledger: &Arc<MockLedger>,
    entries: Vec<RegistryEntry>,
) -> AccountDiscoveryService<MockLedger> {
    let registry = StaticRegistry::new(RegistrySnapshot::new(entries));
    AccountDiscoveryService::with_registry(Arc::clone(ledger), &registry).await
}

fn registry_entry(mint: &Pubkey, name: &str, symbol: &str, decimals: u8) -> RegistryEntry {
    RegistryEntry {
        chain_id: 103,
        address: mint.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        decimals,
        logo_uri: Some(format!("https://example.com/{}.png", symbol)),
    }
}

fn by_mint<'a>(accounts: &'a [AssetAccount], mint: &Pubkey) -> &'a AssetAccount {
    accounts
        .iter()
        .find(|a| a.asset_identifier == mint.to_string())
        .expect("account for mint")
}

//=============================================================================
// Discovery
//=============================================================================

#[tokio::test]
async fn test_zero_holdings_yields_only_native_entry() {
    let ledger = MockLedger::new();
    let wallet = Pubkey::new_unique();
    ledger.set_balance(wallet, 3 * LAMPORTS_PER_SOL / 2);

    // Somebody else's holdings must not leak in
    let mint = ledger.add_mint(6);
    ledger.add_associated_account(Pubkey::new_unique(), mint, 10);

    let accounts = service(&ledger, vec![]).await.discover_all(wallet).await;

    assert_eq!(accounts.len(), 1);
    let native = &accounts[0];
    assert!(native.is_native());
    assert_eq!(native.owner_account_address, wallet);
    assert_eq!(native.balance, 1.5);
    assert_eq!(native.decimal_places, 9);
    assert_eq!(native.symbol.as_deref(), Some(NATIVE_SYMBOL));
    assert_eq!(native.icon_uri.as_deref(), Some(SOLANA_LOGO_URI));
}

#[tokio::test]
async fn test_discovers_and_enriches_token_accounts() {
    let ledger = MockLedger::new();
    let wallet = Pubkey::new_unique();
    ledger.set_balance(wallet, LAMPORTS_PER_SOL);

    let listed = ledger.add_mint(2);
    let with_metadata = ledger.add_mint(6);
    let anonymous = ledger.add_mint(0);
    ledger.add_associated_account(wallet, listed, 50_000);
    ledger.add_associated_account(wallet, with_metadata, 1_000_000);
    ledger.add_associated_account(wallet, anonymous, 7);
    ledger.add_metadata(&with_metadata, "Ledger Token", "LGR", "https://example.com/lgr.json");

    let entries = vec![
        registry_entry(&listed, "Listed Token", "LST", 2),
        registry_entry(&with_metadata, "Registry Name", "REG", 6),
    ];
    let accounts = service(&ledger, entries).await.discover_all(wallet).await;
    assert_eq!(accounts.len(), 4);

    let listed = by_mint(&accounts, &listed);
    assert_eq!(listed.balance, 500.0);
    assert_eq!(listed.display_name.as_deref(), Some("Listed Token"));
    assert_eq!(listed.symbol.as_deref(), Some("LST"));

    let with_metadata = by_mint(&accounts, &with_metadata);
    assert_eq!(with_metadata.display_name.as_deref(), Some("Ledger Token"));
    assert_eq!(with_metadata.symbol.as_deref(), Some("REG"));
    assert_eq!(with_metadata.balance, 1.0);

    let anonymous_account = by_mint(&accounts, &anonymous);
    assert_eq!(anonymous_account.display_name, None);
    assert_eq!(
        anonymous_account.label(),
        format!("Token-{}", &anonymous.to_string()[..10])
    );
    assert_eq!(anonymous_account.balance, 7.0);
}

#[tokio::test]
async fn test_registry_decimals_override_for_unlisted_metadata() {
    let ledger = MockLedger::new();
    let wallet = Pubkey::new_unique();
    let mint = ledger.add_mint(2);
    ledger.add_associated_account(wallet, mint, 123);

    let accounts = service(&ledger, vec![registry_entry(&mint, "Reg", "RG", 5)])
        .await
        .discover_all(wallet)
        .await;

    let account = by_mint(&accounts, &mint);
    assert_eq!(account.decimal_places, 5);
    assert_eq!(account.symbol.as_deref(), Some("RG"));
}

#[tokio::test]
async fn test_native_failure_does_not_block_tokens() {
    let ledger = MockLedger::new();
    let wallet = Pubkey::new_unique();
    let mint = ledger.add_mint(2);
    ledger.add_associated_account(wallet, mint, 100);
    ledger.fail_balance.store(true, Ordering::SeqCst);

    let accounts = service(&ledger, vec![]).await.discover_all(wallet).await;
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].asset_identifier, mint.to_string());
}

#[tokio::test]
async fn test_scan_failure_does_not_block_native() {
    let ledger = MockLedger::new();
    let wallet = Pubkey::new_unique();
    ledger.set_balance(wallet, 42);
    ledger.fail_program_accounts.store(true, Ordering::SeqCst);

    let accounts = service(&ledger, vec![]).await.discover_all(wallet).await;
    assert_eq!(accounts.len(), 1);
    assert!(accounts[0].is_native());
    assert_eq!(accounts[0].raw_amount, 42);
}

#[tokio::test]
async fn test_metadata_failure_degrades_to_registry() {
    let ledger = MockLedger::new();
    let wallet = Pubkey::new_unique();
    let mint = ledger.add_mint(2);
    ledger.add_associated_account(wallet, mint, 100);
    ledger.add_metadata(&mint, "Unreachable", "UNR", "");
    ledger.fail_reads_of(solsend_sdk::utils::derive_metadata_address(&mint));

    let accounts = service(&ledger, vec![registry_entry(&mint, "Fallback", "FB", 2)])
        .await
        .discover_all(wallet)
        .await;

    let account = by_mint(&accounts, &mint);
    assert_eq!(account.display_name.as_deref(), Some("Fallback"));
    assert_eq!(account.balance, 1.0);
}

#[tokio::test]
async fn test_unreadable_mint_uses_registry_decimals() {
    let ledger = MockLedger::new();
    let wallet = Pubkey::new_unique();
    let mint = ledger.add_mint(2);
    ledger.add_associated_account(wallet, mint, 50_000);
    ledger.fail_reads_of(mint);

    let accounts = service(&ledger, vec![registry_entry(&mint, "Listed", "LST", 2)])
        .await
        .discover_all(wallet)
        .await;

    let account = by_mint(&accounts, &mint);
    assert_eq!(account.balance, 500.0);
    assert_eq!(account.raw_amount, 50_000);
    assert_eq!(account.decimal_places, 2);
}

#[tokio::test]
async fn test_unreadable_unlisted_mint_is_left_out() {
    let ledger = MockLedger::new();
    let wallet = Pubkey::new_unique();
    ledger.set_balance(wallet, LAMPORTS_PER_SOL);
    let unreadable = ledger.add_mint(2);
    let readable = ledger.add_mint(2);
    ledger.add_associated_account(wallet, unreadable, 50_000);
    ledger.add_associated_account(wallet, readable, 50_000);
    ledger.fail_reads_of(unreadable);

    let accounts = service(&ledger, vec![]).await.discover_all(wallet).await;

    assert_eq!(accounts.len(), 2);
    assert!(accounts
        .iter()
        .all(|a| a.asset_identifier != unreadable.to_string()));
    assert_eq!(by_mint(&accounts, &readable).balance, 500.0);
}

#[tokio::test]
async fn test_every_item_is_tagged_with_its_pass() {
    let ledger = MockLedger::new();
    let wallet = Pubkey::new_unique();
    ledger.set_balance(wallet, 1);
    let mint = ledger.add_mint(0);
    ledger.add_associated_account(wallet, mint, 1);

    let service = service(&ledger, vec![]).await;
    let items: Vec<_> = service.discover(wallet, 7).collect().await;
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|d| d.generation == 7 && d.wallet == wallet));
}

#[tokio::test]
async fn test_enrichment_is_idempotent_across_passes() {
    let ledger = MockLedger::new();
    let wallet = Pubkey::new_unique();
    let mint = ledger.add_mint(3);
    ledger.add_associated_account(wallet, mint, 5_000);
    ledger.add_metadata(&mint, "Same", "SM", "https://example.com/sm.json");

    let service = service(&ledger, vec![registry_entry(&mint, "Other", "OT", 3)]).await;
    let first = service.discover_all(wallet).await;
    let second = service.discover_all(wallet).await;
    assert_eq!(by_mint(&first, &mint), by_mint(&second, &mint));
}

//=============================================================================
// Session
//=============================================================================

#[tokio::test]
async fn test_session_refresh_collects_pass() {
    let ledger = MockLedger::new();
    let wallet = Pubkey::new_unique();
    ledger.set_balance(wallet, LAMPORTS_PER_SOL);
    let mint = ledger.add_mint(2);
    ledger.add_associated_account(wallet, mint, 100);

    let service = service(&ledger, vec![]).await;
    let mut session = WalletSession::new();
    session.set_wallet(Some(wallet));

    assert_eq!(session.refresh(&service).await, 2);
    assert_eq!(session.accounts().len(), 2);

    // A second pass replaces the collection instead of appending to it
    assert_eq!(session.refresh(&service).await, 2);
    assert_eq!(session.accounts().len(), 2);
}

#[tokio::test]
async fn test_results_of_superseded_wallet_are_discarded() {
    let ledger = MockLedger::new();
    let old_wallet = Pubkey::new_unique();
    let new_wallet = Pubkey::new_unique();
    ledger.set_balance(old_wallet, 1);
    let service = service(&ledger, vec![]).await;

    let session = Mutex::new(WalletSession::new());
    let stale_generation = session.lock().await.set_wallet(Some(old_wallet));

    // Produce the old wallet's pass, then switch wallets before merging it
    let items: Vec<_> = service.discover(old_wallet, stale_generation).collect().await;
    assert_eq!(items.len(), 1);
    session.lock().await.set_wallet(Some(new_wallet));

    for item in items {
        assert!(!session.lock().await.accept(item));
    }
    assert!(session.lock().await.accounts().is_empty());

    ledger.set_balance(new_wallet, 9);
    assert_eq!(drive_pass(&session, &service).await, 1);
    let guard = session.lock().await;
    assert_eq!(guard.accounts()[0].owner_account_address, new_wallet);
}
