//! Request envelope for the capability surface.
//!
//! Every capability method takes a [`ChainRequest`] naming the chain and
//! network it targets. Adapters reject envelopes addressed to another chain
//! or network before doing any work.

use crate::ChainError;
use serde::{Deserialize, Serialize};

/// Chain/network envelope around a method-specific body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRequest<T> {
	pub chain: String,
	#[serde(default)]
	pub network: String,
	#[serde(flatten)]
	pub body: T,
}

impl<T> ChainRequest<T> {
	pub fn new(chain: impl Into<String>, network: impl Into<String>, body: T) -> Self {
		Self {
			chain: chain.into(),
			network: network.into(),
			body,
		}
	}

	/// Fails fast when the envelope targets a different adapter.
	///
	/// An empty network matches any network.
	pub fn ensure_target(&self, chain: &str, network: &str) -> Result<(), ChainError> {
		if self.chain != chain {
			return Err(ChainError::InvalidInput(format!(
				"chain mismatch: adapter serves {}, request targets {}",
				chain, self.chain
			)));
		}
		if !self.network.is_empty() && self.network != network {
			return Err(ChainError::InvalidInput(format!(
				"network mismatch: adapter serves {}, request targets {}",
				network, self.network
			)));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportChains {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertAddress {
	/// Hex-encoded public key, optional 0x prefix.
	pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateAddress {
	pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockByNumber {
	/// Zero selects the latest block.
	pub height: u64,
	#[serde(default)]
	pub view_tx: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockByHash {
	pub hash: String,
	#[serde(default)]
	pub view_tx: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderByNumber {
	/// Zero selects the latest header.
	pub height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderByHash {
	pub hash: String,
}

/// Inclusive height range, given as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRange {
	pub start: String,
	pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountQuery {
	pub address: String,
	#[serde(default)]
	pub contract_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuery {
	/// Unsigned message the fee is quoted for (Solana).
	#[serde(default)]
	pub raw_tx: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTx {
	pub raw_tx: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxByAddress {
	pub address: String,
	#[serde(default)]
	pub contract_address: Option<String>,
	pub page: u32,
	pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxByHash {
	pub hash: String,
}

/// Base64-encoded JSON transfer request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTx {
	pub base64_tx: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
	pub base64_tx: String,
	/// Hex signature from the external signer.
	pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeTx {
	pub raw_tx: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyTx {
	pub raw_tx: String,
	/// Sender the recovered signer must match, when given.
	#[serde(default)]
	pub expected_sender: Option<String>,
}

/// Chain-specific escape hatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraData {
	pub kind: String,
	#[serde(default)]
	pub params: serde_json::Value,
}
