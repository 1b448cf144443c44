//! Block-level types shared by all chains.

use crate::transaction::TransferKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chain-agnostic block header.
///
/// Chain-specific fields that have no common counterpart go into `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
	pub hash: String,
	pub parent_hash: String,
	pub number: u64,
	pub timestamp: u64,
	/// Gas used (EVM) or compute units consumed (Solana).
	pub gas_used: u64,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub extra: BTreeMap<String, String>,
}

/// Normalized view of one on-chain transfer inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTransaction {
	pub hash: String,
	pub from: String,
	pub to: String,
	pub amount: String,
	/// Token mint or contract when the transfer is not native.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_address: Option<String>,
	/// Program or contract that performed the movement.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub contract_wallet: Option<String>,
	pub height: u64,
	pub kind: TransferKind,
}

/// Block with optional transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
	pub hash: String,
	pub height: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub base_fee: Option<String>,
	#[serde(default)]
	pub transactions: Vec<BlockTransaction>,
}
