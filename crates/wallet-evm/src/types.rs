//! Typed views of EVM JSON-RPC payloads.

use alloy_consensus::Header;
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use wallet_types::{BlockHeader, ChainError};

/// Block selector for `eth_getBlockByNumber` style parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockNumber {
	Latest,
	Safe,
	Finalized,
	Pending,
	Earliest,
	Number(u64),
}

impl BlockNumber {
	/// `None` selects the latest block.
	pub fn from_height(height: Option<u64>) -> Self {
		height.map_or(BlockNumber::Latest, BlockNumber::Number)
	}

	pub fn to_arg(self) -> String {
		match self {
			BlockNumber::Latest => "latest".into(),
			BlockNumber::Safe => "safe".into(),
			BlockNumber::Finalized => "finalized".into(),
			BlockNumber::Pending => "pending".into(),
			BlockNumber::Earliest => "earliest".into(),
			BlockNumber::Number(n) => format!("0x{:x}", n),
		}
	}
}

/// Consensus header together with the hash the node reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmHeader {
	pub hash: B256,
	pub header: Header,
}

impl EvmHeader {
	/// Parses a header object as returned by `eth_getBlockByNumber(.., false)`.
	pub fn from_rpc(value: Value) -> Result<Self, ChainError> {
		let hash = value
			.get("hash")
			.cloned()
			.ok_or_else(|| ChainError::Protocol("header without hash".into()))
			.and_then(|h| {
				serde_json::from_value::<B256>(h)
					.map_err(|e| ChainError::Protocol(format!("invalid header hash: {}", e)))
			})?;
		let header = serde_json::from_value::<Header>(value)
			.map_err(|e| ChainError::Protocol(format!("invalid header: {}", e)))?;
		Ok(Self { hash, header })
	}

	/// Hash recomputed from the header fields.
	pub fn computed_hash(&self) -> B256 {
		self.header.hash_slow()
	}

	pub fn to_block_header(&self) -> BlockHeader {
		let h = &self.header;
		let mut header = BlockHeader {
			hash: self.hash.to_string(),
			parent_hash: h.parent_hash.to_string(),
			number: h.number,
			timestamp: h.timestamp,
			gas_used: h.gas_used,
			..Default::default()
		};
		header.extra.insert("gas_limit".into(), h.gas_limit.to_string());
		header.extra.insert("miner".into(), h.beneficiary.to_checksum(None));
		header.extra.insert("state_root".into(), h.state_root.to_string());
		if let Some(base_fee) = h.base_fee_per_gas {
			header.extra.insert("base_fee".into(), base_fee.to_string());
		}
		header
	}
}

/// Transaction entry inside a block, hash-only or full.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactionEntry {
	Full(RpcTransaction),
	Hash(B256),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
	pub hash: B256,
	pub number: U64,
	#[serde(default)]
	pub base_fee_per_gas: Option<U256>,
	#[serde(default)]
	pub transactions: Vec<BlockTransactionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
	pub hash: B256,
	pub from: Address,
	#[serde(default)]
	pub to: Option<Address>,
	#[serde(default)]
	pub value: U256,
	#[serde(default)]
	pub input: Bytes,
	#[serde(default)]
	pub nonce: U64,
	#[serde(default)]
	pub gas: U64,
	#[serde(default)]
	pub gas_price: Option<U256>,
	#[serde(default)]
	pub block_number: Option<U64>,
	#[serde(default)]
	pub chain_id: Option<U64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
	pub transaction_hash: B256,
	/// `0x1` success, `0x0` failure. Absent on pre-Byzantium receipts.
	#[serde(default)]
	pub status: Option<U64>,
	#[serde(default)]
	pub block_number: Option<U64>,
	#[serde(default)]
	pub gas_used: U64,
	#[serde(default)]
	pub effective_gas_price: Option<U256>,
	#[serde(default)]
	pub contract_address: Option<Address>,
}

impl RpcReceipt {
	pub fn succeeded(&self) -> bool {
		self.status.map_or(true, |s| s == U64::from(1))
	}

	/// Gas used times effective price, in wei.
	pub fn fee(&self) -> U256 {
		U256::from(self.gas_used.to::<u64>()) * self.effective_gas_price.unwrap_or_default()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
	pub address: Address,
	#[serde(default)]
	pub topics: Vec<B256>,
	#[serde(default)]
	pub data: Bytes,
	#[serde(default)]
	pub block_number: Option<U64>,
	#[serde(default)]
	pub transaction_hash: Option<B256>,
	#[serde(default)]
	pub log_index: Option<U64>,
	#[serde(default)]
	pub removed: bool,
}

/// `eth_getLogs` filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
	pub block_hash: Option<B256>,
	pub from_block: Option<BlockNumber>,
	pub to_block: Option<BlockNumber>,
	pub addresses: Vec<Address>,
	/// Positional topic filters; `None` matches anything in that position.
	pub topics: Vec<Option<Vec<B256>>>,
}

impl FilterQuery {
	/// Builds the filter object. A block hash excludes a from/to range.
	pub fn to_arg(&self) -> Result<Value, ChainError> {
		let mut arg = Map::new();
		arg.insert("address".into(), json!(self.addresses));
		arg.insert("topics".into(), json!(self.topics));
		match self.block_hash {
			Some(hash) => {
				if self.from_block.is_some() || self.to_block.is_some() {
					return Err(ChainError::InvalidInput(
						"cannot specify both block_hash and from_block/to_block".into(),
					));
				}
				arg.insert("blockHash".into(), json!(hash));
			},
			None => {
				let from = self.from_block.map_or_else(|| "0x0".to_string(), BlockNumber::to_arg);
				arg.insert("fromBlock".into(), json!(from));
				arg.insert("toBlock".into(), json!(self.target_block().to_arg()));
			},
		}
		Ok(Value::Object(arg))
	}

	/// Block whose header accompanies the logs.
	pub fn target_block(&self) -> BlockNumber {
		self.to_block.unwrap_or(BlockNumber::Latest)
	}
}

/// Logs plus the header of the filter's target block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logs {
	pub logs: Vec<RpcLog>,
	pub to_block_header: EvmHeader,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccountProof {
	pub storage_hash: B256,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_block_number_args() {
		assert_eq!(BlockNumber::Number(100).to_arg(), "0x64");
		assert_eq!(BlockNumber::from_height(None).to_arg(), "latest");
		assert_eq!(BlockNumber::Finalized.to_arg(), "finalized");
	}

	#[test]
	fn test_filter_arg_defaults() {
		let arg = FilterQuery::default().to_arg().unwrap();
		assert_eq!(arg["fromBlock"], "0x0");
		assert_eq!(arg["toBlock"], "latest");
		assert!(arg.get("blockHash").is_none());
	}

	#[test]
	fn test_filter_arg_rejects_hash_with_range() {
		let query = FilterQuery {
			block_hash: Some(B256::repeat_byte(1)),
			to_block: Some(BlockNumber::Number(5)),
			..Default::default()
		};
		assert!(query.to_arg().is_err());

		let by_hash = FilterQuery {
			block_hash: Some(B256::repeat_byte(1)),
			..Default::default()
		};
		let arg = by_hash.to_arg().unwrap();
		assert!(arg.get("fromBlock").is_none());
		assert!(arg.get("blockHash").is_some());
	}

	#[test]
	fn test_header_roundtrip_hash() {
		let header = Header {
			number: 7,
			timestamp: 1_700_000_000,
			gas_used: 21_000,
			base_fee_per_gas: Some(7),
			..Default::default()
		};
		let mut value = serde_json::to_value(&header).unwrap();
		value["hash"] = json!(header.hash_slow());

		let parsed = EvmHeader::from_rpc(value).unwrap();
		assert_eq!(parsed.hash, parsed.computed_hash());
		let block_header = parsed.to_block_header();
		assert_eq!(block_header.number, 7);
		assert_eq!(block_header.extra.get("base_fee").map(String::as_str), Some("7"));
	}

	#[test]
	fn test_receipt_status() {
		let receipt: RpcReceipt = serde_json::from_value(json!({
			"transactionHash": B256::ZERO,
			"status": "0x0",
			"gasUsed": "0x5208",
			"effectiveGasPrice": "0x3b9aca00"
		}))
		.unwrap();
		assert!(!receipt.succeeded());
		assert_eq!(receipt.fee(), U256::from(21_000u64 * 1_000_000_000));
	}
}
