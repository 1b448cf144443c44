//! Well-known program identifiers.

use solana_sdk::pubkey::Pubkey;

pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const ASSOCIATED_TOKEN_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";
pub const TOKEN_METADATA_PROGRAM_ID: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";
pub const CANDY_MACHINE_PROGRAM_ID: &str = "cndyAnrLdpQ5YwhpQdNceFMvx6bM2he7u3U4LVzGzjA";
pub const BUBBLEGUM_PROGRAM_ID: &str = "BGumetW1zi6dfL4nqJG1oD8T4PZ9FeZr4u8B7u4N1NYy";

/// Programs whose `transfer` instructions move NFTs.
pub const NFT_PROGRAM_IDS: [&str; 4] = [
	TOKEN_METADATA_PROGRAM_ID,
	CANDY_MACHINE_PROGRAM_ID,
	BUBBLEGUM_PROGRAM_ID,
	TOKEN_PROGRAM_ID,
];

pub const SYSTEM_PROGRAM: Pubkey = solana_sdk::pubkey!("11111111111111111111111111111111");
pub const TOKEN_PROGRAM: Pubkey = solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub const ASSOCIATED_TOKEN_PROGRAM: Pubkey = solana_sdk::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");
pub const RENT_SYSVAR: Pubkey = solana_sdk::pubkey!("SysvarRent111111111111111111111111111111111");

/// `spl-token` name used by `jsonParsed` output.
pub const SPL_TOKEN_PROGRAM_NAME: &str = "spl-token";

pub fn is_nft_program(program_id: &str) -> bool {
	NFT_PROGRAM_IDS.contains(&program_id)
}
