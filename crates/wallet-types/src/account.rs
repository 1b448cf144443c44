//! Account and fee snapshots.
//!
//! Both are re-fetched from the node on every query and never cached.

use serde::{Deserialize, Serialize};

/// Point-in-time view of an on-chain account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainAccount {
	pub address: String,
	/// Non-negative integer in the chain's base unit (wei / lamports).
	pub balance: String,
	/// EVM nonce, or the latest Solana blockhash used as a replay token.
	pub sequence: String,
	pub network: String,
}

/// Whether an EVM address holds bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
	/// Externally-owned account, no bytecode.
	Eoa,
	Contract,
}

/// One fee suggestion tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTier {
	/// Base component: EVM gas price or Solana message fee.
	pub base_fee: String,
	/// Priority component: EVM tip or scaled Solana prioritization fee.
	pub priority_fee: String,
	/// Multiplier the tier represents. EVM callers apply it themselves.
	pub multiplier: String,
	/// Suggested price for this tier.
	pub gas_price: String,
}

/// Slow / normal / fast fee suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
	pub slow: FeeTier,
	pub normal: FeeTier,
	pub fast: FeeTier,
}
