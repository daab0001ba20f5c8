use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

/// Metaplex token-metadata program, owner of the per-mint metadata PDAs
pub const METADATA_PROGRAM_ID: Pubkey = pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Seed prefix of the metadata PDA: ["metadata", program_id, mint]
pub const METADATA_SEED: &[u8] = b"metadata";

/// Size in bytes of an SPL token account
pub const TOKEN_ACCOUNT_LEN: u64 = 165;

/// Offset of the owner field inside an SPL token account (after the 32-byte mint)
pub const TOKEN_ACCOUNT_OWNER_OFFSET: usize = 32;

/// Decimal scale of the native asset (lamports per SOL = 10^9)
pub const NATIVE_DECIMALS: u8 = 9;

pub const NATIVE_NAME: &str = "Solana";
pub const NATIVE_SYMBOL: &str = "SOL";
pub const SOLANA_LOGO_URI: &str = "https://raw.githubusercontent.com/solana-labs/token-list/main/assets/mainnet/So11111111111111111111111111111111111111112/logo.png";

/// Number of mint characters shown in the fallback label of unnamed assets
pub const LABEL_PREFIX_LEN: usize = 10;

/// Upper bound on concurrent per-account enrichments in one discovery pass
pub const DISCOVERY_CONCURRENCY: usize = 8;

pub const EXPLORER_BASE_URL: &str = "https://explorer.solana.com";
