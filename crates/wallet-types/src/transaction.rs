//! Transaction lifecycle and classification types.
//!
//! Writes flow Build -> external sign -> Attach -> Verify/Broadcast. Only the
//! build, attach and verify stages run inside this system; signing happens
//! elsewhere and the caller resubmits the original request with the signature.

use serde::{Deserialize, Serialize};

/// Tag of a [`TransferClassification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
	Native,
	FungibleToken,
	Nft,
	ContractCall,
}

/// Parties and value of a movement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
	pub from: String,
	pub to: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_address: Option<String>,
	pub amount: String,
}

/// Exactly one classification per transaction.
///
/// Selected by inspecting program identifiers and call data, never from
/// caller-supplied metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "transfer", rename_all = "snake_case")]
pub enum TransferClassification {
	Native(Transfer),
	FungibleToken(Transfer),
	Nft(Transfer),
	ContractCall(Transfer),
}

impl TransferClassification {
	pub fn kind(&self) -> TransferKind {
		match self {
			TransferClassification::Native(_) => TransferKind::Native,
			TransferClassification::FungibleToken(_) => TransferKind::FungibleToken,
			TransferClassification::Nft(_) => TransferKind::Nft,
			TransferClassification::ContractCall(_) => TransferKind::ContractCall,
		}
	}

	pub fn transfer(&self) -> &Transfer {
		match self {
			TransferClassification::Native(t)
			| TransferClassification::FungibleToken(t)
			| TransferClassification::Nft(t)
			| TransferClassification::ContractCall(t) => t,
		}
	}

	pub fn into_transfer(self) -> Transfer {
		match self {
			TransferClassification::Native(t)
			| TransferClassification::FungibleToken(t)
			| TransferClassification::Nft(t)
			| TransferClassification::ContractCall(t) => t,
		}
	}
}

/// Execution status of a looked-up transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
	Pending,
	Success,
	Failed,
}

/// Transaction as returned by hash or address lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMessage {
	pub hash: String,
	pub from: String,
	pub to: String,
	pub amount: String,
	pub fee: String,
	pub status: TxStatus,
	pub kind: TransferKind,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub contract_address: Option<String>,
	pub height: u64,
}

/// Signing payload plus the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
	/// Hex signing payload: EIP-1559 signing hash or serialized Solana message.
	pub payload: String,
	/// Base64 request that must be resubmitted with the signature.
	pub inputs: String,
}

/// Broadcast-ready transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
	/// 0x-hex RLP envelope (EVM) or base58 transaction (Solana).
	pub raw_tx: String,
	pub tx_hash: String,
}
