use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use solana_sdk::pubkey::Pubkey;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::connection::LedgerConnection;
use crate::core::constants::DISCOVERY_CONCURRENCY;
use crate::metadata::{
    EnrichmentPipeline, MetadataSource, MetaplexMetadata, RegistrySnapshot, RegistrySource,
};
use crate::types::{AssetAccount, RawTokenAccount};
use crate::utils;

/// An account produced by a discovery pass, tagged with the pass it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Discovered {
    pub generation: u64,
    pub wallet: Pubkey,
    pub account: AssetAccount,
}

/// Finds the native balance and every SPL token account of a wallet.
pub struct AccountDiscoveryService<C> {
    connection: Arc<C>,
    pipeline: EnrichmentPipeline,
    token_program: Pubkey,
    concurrency: usize,
}

impl<C: LedgerConnection> AccountDiscoveryService<C> {
    pub fn new(connection: Arc<C>, pipeline: EnrichmentPipeline) -> Self {
        Self {
            connection,
            pipeline,
            token_program: spl_token::id(),
            concurrency: DISCOVERY_CONCURRENCY,
        }
    }

    /// Service reading on-ledger metadata through the same connection.
    /// A registry that fails to resolve degrades to an empty snapshot.
    pub async fn with_registry(connection: Arc<C>, registry: &dyn RegistrySource) -> Self
    where
        C: 'static,
    {
        let snapshot = match registry.resolve().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "token registry unavailable, continuing without it");
                RegistrySnapshot::default()
            },
        };
        let metadata: Arc<dyn MetadataSource> =
            Arc::new(MetaplexMetadata::new(Arc::clone(&connection)));
        Self::new(
            connection,
            EnrichmentPipeline::new(metadata, Arc::new(snapshot)),
        )
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Start a discovery pass for `wallet`.
    ///
    /// The native balance and the token-account scan run concurrently; each
    /// token account is emitted as soon as its enrichment completes, so the
    /// arrival order is unspecified. Failures of either query only drop the
    /// entries that query would have produced. A token account whose decimal
    /// scale is known neither from its mint nor from the registry is left out.
    pub fn discover(&self, wallet: Pubkey, generation: u64) -> BoxStream<'_, Discovered> {
        info!(%wallet, generation, "starting discovery pass");

        let native = stream::once(self.native_entry(wallet)).filter_map(future::ready);
        let tokens = stream::once(self.scan_token_accounts(wallet)).flat_map(move |raws| {
            stream::iter(raws)
                .map(move |raw| self.enrich_account(raw))
                .buffer_unordered(self.concurrency)
                .filter_map(future::ready)
        });

        let emitted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&emitted);
        let finished = stream::once(async move {
            info!(
                %wallet,
                generation,
                accounts = emitted.load(Ordering::Relaxed),
                "discovery pass finished"
            );
            None::<Discovered>
        })
        .filter_map(future::ready);

        stream::select(native, tokens)
            .map(move |account| {
                counter.fetch_add(1, Ordering::Relaxed);
                Discovered {
                    generation,
                    wallet,
                    account,
                }
            })
            .chain(finished)
            .boxed()
    }

    /// Run a pass to completion
    pub async fn discover_all(&self, wallet: Pubkey) -> Vec<AssetAccount> {
        self.discover(wallet, 0)
            .map(|discovered| discovered.account)
            .collect()
            .await
    }

    async fn native_entry(&self, wallet: Pubkey) -> Option<AssetAccount> {
        match self.connection.get_balance(&wallet).await {
            Ok(lamports) => Some(AssetAccount::native(wallet, lamports)),
            Err(e) => {
                warn!(%wallet, error = %e, "native balance query failed");
                None
            },
        }
    }

    async fn scan_token_accounts(&self, wallet: Pubkey) -> Vec<RawTokenAccount> {
        let accounts = match self
            .connection
            .get_program_accounts(&self.token_program, utils::token_account_filters(&wallet))
            .await
        {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!(%wallet, error = %e, "token account scan failed");
                return Vec::new();
            },
        };
        debug!(%wallet, count = accounts.len(), "token accounts found");

        accounts
            .into_iter()
            .filter_map(|(address, account)| {
                match utils::decode_token_account(address, &account.data) {
                    Ok(raw) => Some(raw),
                    Err(e) => {
                        warn!(%address, error = %e, "skipping undecodable token account");
                        None
                    },
                }
            })
            .collect()
    }

    async fn enrich_account(&self, mut raw: RawTokenAccount) -> Option<AssetAccount> {
        raw.decimals = self.mint_decimals(&raw.mint).await;
        self.pipeline.enrich(&raw).await
    }

    async fn mint_decimals(&self, mint: &Pubkey) -> Option<u8> {
        match self.connection.get_account(mint).await {
            Ok(Some(account)) => match utils::decode_mint_decimals(&account.data) {
                Ok(decimals) => Some(decimals),
                Err(e) => {
                    warn!(%mint, error = %e, "mint account malformed");
                    None
                },
            },
            Ok(None) => {
                debug!(%mint, "mint account not found");
                None
            },
            Err(e) => {
                warn!(%mint, error = %e, "mint lookup failed");
                None
            },
        }
    }
}
