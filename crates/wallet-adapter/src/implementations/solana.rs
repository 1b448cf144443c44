//! Solana adapter backed by the SVM JSON-RPC client.

use crate::explorer::{EtherscanClient, ExplorerInterface, HistoryQuery};
use crate::{AdapterError, ChainAdapter};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};
use wallet_rpc::RpcOptions;
use wallet_svm::classify::{block_transaction, organize_by_slot, tx_message};
use wallet_svm::codec::{self, TxStructure};
use wallet_svm::fee;
use wallet_svm::{BlockResult, Commitment, SignaturesQuery, SimulateOptions, SvmClient, TransactionDetails};
use wallet_types::{
	without_0x_prefix, AccountQuery, Block, BlockByHash, BlockByNumber, BlockHeader, ChainAccount, ChainError,
	ChainRequest, ConfigSchema, ConvertAddress, DecodeTx, ExtraData, FeeQuery, FeeQuote, Field, FieldType,
	HeaderByHash, HeaderByNumber, HeaderRange, RangeResult, Schema, SendTx, SignedTransaction, SignedTx,
	TxByAddress, TxByHash, TxMessage, UnsignedTransaction, UnsignedTx, ValidateAddress, ValidationError, VerifyTx,
};

pub const CHAIN_NAME: &str = "Solana";

/// Widest slot range served in one request.
pub const MAX_BLOCK_RANGE: u64 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct SolanaSettings {
	pub network: String,
	pub rpc_url: String,
	#[serde(default = "default_timeout")]
	pub request_timeout_seconds: u64,
	#[serde(default = "default_dial_attempts")]
	pub dial_attempts: u32,
	#[serde(default)]
	pub explorer_url: Option<String>,
	#[serde(default)]
	pub explorer_api_key: Option<String>,
}

fn default_timeout() -> u64 {
	30
}

fn default_dial_attempts() -> u32 {
	5
}

pub struct SolanaAdapter {
	client: SvmClient,
	network: String,
	explorer: Option<Box<dyn ExplorerInterface>>,
}

impl SolanaAdapter {
	pub fn new(client: SvmClient, network: impl Into<String>, explorer: Option<Box<dyn ExplorerInterface>>) -> Self {
		Self {
			client,
			network: network.into(),
			explorer,
		}
	}

	/// Dials the configured node, using `getHealth` as the handshake.
	pub async fn connect(settings: SolanaSettings) -> Result<Self, AdapterError> {
		let options = RpcOptions {
			request_timeout: Duration::from_secs(settings.request_timeout_seconds),
			dial_attempts: settings.dial_attempts,
			..Default::default()
		};
		let client = SvmClient::dial(&settings.rpc_url, &options).await?;
		let explorer = match &settings.explorer_url {
			Some(url) => Some(Box::new(
				EtherscanClient::new(url.clone(), settings.explorer_api_key.clone())?.with_actions("sol", "spl"),
			) as Box<dyn ExplorerInterface>),
			None => None,
		};
		info!(
			network = %settings.network,
			explorer = explorer.is_some(),
			"solana adapter ready"
		);
		Ok(Self::new(client, settings.network, explorer))
	}

	/// Zero selects the latest finalized slot.
	async fn resolve_slot(&self, height: u64) -> Result<u64, ChainError> {
		if height != 0 {
			return Ok(height);
		}
		self.client.get_slot(Commitment::Finalized).await
	}

	async fn block_at(&self, slot: u64, view_tx: bool) -> Result<Block, ChainError> {
		let block = self.client.get_block_by_slot(slot, block_details(view_tx)).await?;
		Ok(block_from_result(block, slot))
	}

	/// Walks `start..=end` slot by slot. A failure keeps what was already
	/// organized and stops the walk.
	async fn walk_range(&self, start: u64, end: u64) -> RangeResult<BlockHeader> {
		let mut headers = Vec::new();
		for slot in start..=end {
			let block = match self.client.get_block_by_slot(slot, TransactionDetails::Signatures).await {
				Ok(block) => block,
				Err(e) => return RangeResult::partial(headers, e.context(format!("slot {}", slot))),
			};
			if block.signatures.is_empty() {
				debug!(slot, "skipping slot without transactions");
				continue;
			}
			let fetched = match self.client.get_transaction_range(&block.signatures).await {
				Ok(fetched) => fetched,
				Err(e) => return RangeResult::partial(headers, e),
			};
			headers.extend(organize_by_slot(&fetched.items));
			if let Some(err) = fetched.error {
				return RangeResult::partial(headers, err);
			}
		}
		RangeResult::complete(headers)
	}
}

fn block_details(view_tx: bool) -> TransactionDetails {
	if view_tx {
		TransactionDetails::Full
	} else {
		TransactionDetails::None
	}
}

fn block_from_result(block: BlockResult, slot: u64) -> Block {
	let transactions = block
		.transactions
		.iter()
		.filter_map(|entry| match block_transaction(&entry.transaction, entry.meta.as_ref(), slot) {
			Ok(tx) => Some(tx),
			Err(e) => {
				warn!(slot, error = %e, "skipping unclassifiable transaction");
				None
			},
		})
		.collect();
	Block {
		hash: block.blockhash,
		height: slot,
		base_fee: None,
		transactions,
	}
}

fn header_from_result(block: &BlockResult, slot: u64) -> BlockHeader {
	let mut extra = std::collections::BTreeMap::new();
	extra.insert("parent_slot".to_string(), block.parent_slot.to_string());
	if let Some(height) = block.block_height {
		extra.insert("block_height".to_string(), height.to_string());
	}
	extra.insert("tx_count".to_string(), block.signatures.len().to_string());
	BlockHeader {
		hash: block.blockhash.clone(),
		parent_hash: block.previous_blockhash.clone(),
		number: slot,
		timestamp: block.block_time.and_then(|t| u64::try_from(t).ok()).unwrap_or_default(),
		gas_used: 0,
		extra,
	}
}

fn parse_slot(field: &str, value: &str) -> Result<u64, ChainError> {
	value
		.trim()
		.parse()
		.map_err(|e| ChainError::InvalidInput(format!("invalid {} '{}': {}", field, value, e)))
}

/// Accepts a hex serialized message and re-encodes it as base64; anything
/// else is passed through as base64 already.
fn message_base64(raw: &str) -> Result<String, ChainError> {
	let raw = raw.trim();
	if raw.is_empty() {
		return Err(ChainError::InvalidInput("empty message".into()));
	}
	match hex::decode(without_0x_prefix(raw)) {
		Ok(bytes) => Ok(STANDARD.encode(bytes)),
		Err(_) => Ok(raw.to_string()),
	}
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, ChainError> {
	params
		.get(key)
		.and_then(Value::as_str)
		.ok_or_else(|| ChainError::InvalidInput(format!("missing '{}' parameter", key)))
}

/// Configuration schema for the Solana adapter.
pub struct SolanaAdapterSchema;

impl SolanaAdapterSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for SolanaAdapterSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("network", FieldType::OneOf(&["mainnet", "testnet", "devnet"])),
				Field::new("rpc_url", FieldType::Url),
			],
			vec![
				Field::new(
					"request_timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
				Field::new(
					"dial_attempts",
					FieldType::Integer {
						min: Some(1),
						max: Some(20),
					},
				),
				Field::new("explorer_url", FieldType::Url),
				Field::new("explorer_api_key", FieldType::String),
			],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(SolanaAdapterSchema)
	}

	fn chain(&self) -> &str {
		CHAIN_NAME
	}

	fn network(&self) -> &str {
		&self.network
	}

	async fn convert_address(&self, request: &ChainRequest<ConvertAddress>) -> Result<String, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		codec::public_key_to_address(&request.body.public_key)
	}

	async fn validate_address(&self, request: &ChainRequest<ValidateAddress>) -> Result<bool, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		Ok(codec::is_valid_address(&request.body.address))
	}

	async fn block_by_number(&self, request: &ChainRequest<BlockByNumber>) -> Result<Block, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let slot = self.resolve_slot(request.body.height).await?;
		self.block_at(slot, request.body.view_tx).await
	}

	async fn block_by_hash(&self, request: &ChainRequest<BlockByHash>) -> Result<Block, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let (slot, block) = self
			.client
			.get_block_by_hash(&request.body.hash, block_details(request.body.view_tx))
			.await?;
		Ok(block_from_result(block, slot))
	}

	async fn header_by_number(&self, request: &ChainRequest<HeaderByNumber>) -> Result<BlockHeader, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let slot = self.resolve_slot(request.body.height).await?;
		let block = self.client.get_block_by_slot(slot, TransactionDetails::Signatures).await?;
		Ok(header_from_result(&block, slot))
	}

	async fn header_by_hash(&self, request: &ChainRequest<HeaderByHash>) -> Result<BlockHeader, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let (slot, block) = self
			.client
			.get_block_by_hash(&request.body.hash, TransactionDetails::Signatures)
			.await?;
		Ok(header_from_result(&block, slot))
	}

	async fn header_range(
		&self,
		request: &ChainRequest<HeaderRange>,
	) -> Result<RangeResult<BlockHeader>, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let start = parse_slot("start", &request.body.start)?;
		let end = parse_slot("end", &request.body.end)?;
		if start == 0 {
			return Err(ChainError::InvalidInput("start slot cannot be 0".into()));
		}
		if end < start {
			return Err(ChainError::InvalidInput(format!(
				"range end {} is before start {}",
				end, start
			)));
		}
		if end - start >= MAX_BLOCK_RANGE {
			return Err(ChainError::InvalidInput(format!(
				"range of {} slots exceeds maximum {}",
				end - start + 1,
				MAX_BLOCK_RANGE
			)));
		}

		let result = self.walk_range(start, end).await;
		match result.error {
			Some(err) if result.items.is_empty() => Err(err),
			Some(err) => {
				warn!(start, end, fetched = result.items.len(), error = %err, "slot range incomplete");
				Ok(RangeResult::partial(result.items, err))
			},
			None if result.items.is_empty() => Err(ChainError::NotFound(format!(
				"no transactions found in slots {}..={}",
				start, end
			))),
			None => Ok(result),
		}
	}

	/// Lamports held by the address; the sequence is the latest finalized
	/// blockhash, which a new transaction must reference.
	async fn account(&self, request: &ChainRequest<AccountQuery>) -> Result<ChainAccount, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		if request
			.body
			.contract_address
			.as_deref()
			.is_some_and(|c| !c.trim().is_empty() && c.trim() != "0x00")
		{
			return Err(ChainError::not_implemented("token balance lookup"));
		}
		let address = request.body.address.trim();
		let (info, blockhash) = tokio::try_join!(
			self.client.get_account_info(address),
			self.client.get_latest_blockhash(Commitment::Finalized)
		)?;
		Ok(ChainAccount {
			address: address.to_string(),
			balance: info.lamports.to_string(),
			sequence: blockhash,
			network: self.network.clone(),
		})
	}

	async fn fee(&self, request: &ChainRequest<FeeQuery>) -> Result<FeeQuote, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let raw = request
			.body
			.raw_tx
			.as_deref()
			.ok_or_else(|| ChainError::InvalidInput("fee estimation requires a serialized message".into()))?;
		fee::suggest_fee(&self.client, &message_base64(raw)?).await
	}

	async fn send_tx(&self, request: &ChainRequest<SendTx>) -> Result<String, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		self.client.send_transaction(&request.body.raw_tx, None).await
	}

	async fn tx_by_address(&self, request: &ChainRequest<TxByAddress>) -> Result<Vec<TxMessage>, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let body = &request.body;
		if let Some(explorer) = &self.explorer {
			let query = HistoryQuery {
				address: body.address.clone(),
				contract_address: body.contract_address.clone(),
				page: body.page,
				page_size: body.page_size,
			};
			return explorer.transactions_by_address(&query).await;
		}

		// The node pages by cursor, so earlier pages are fetched and dropped.
		let page = u64::from(body.page.max(1));
		let page_size = u64::from(body.page_size.max(1));
		let query = SignaturesQuery {
			limit: Some(page * page_size),
			..Default::default()
		};
		let infos = self
			.client
			.get_signatures_for_address(&body.address, Commitment::Finalized, &query)
			.await?;
		let signatures: Vec<String> = infos
			.into_iter()
			.skip(((page - 1) * page_size) as usize)
			.map(|info| info.signature)
			.collect();
		if signatures.is_empty() {
			return Ok(Vec::new());
		}

		let fetched = self.client.get_transaction_range(&signatures).await?.into_result()?;
		fetched.iter().map(tx_message).collect()
	}

	async fn tx_by_hash(&self, request: &ChainRequest<TxByHash>) -> Result<TxMessage, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let tx = self.client.get_transaction(&request.body.hash).await?;
		tx_message(&tx)
	}

	async fn create_unsigned_tx(
		&self,
		request: &ChainRequest<UnsignedTx>,
	) -> Result<UnsignedTransaction, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let tx = TxStructure::from_base64(&request.body.base64_tx)?;
		let resolved = codec::resolve(&self.client, &tx).await?;
		codec::build_unsigned(&resolved)
	}

	async fn build_signed_tx(&self, request: &ChainRequest<SignedTx>) -> Result<SignedTransaction, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let tx = TxStructure::from_base64(&request.body.base64_tx)?;
		let resolved = codec::resolve(&self.client, &tx).await?;
		codec::attach_signature(&resolved, &request.body.signature)
	}

	async fn decode_tx(&self, request: &ChainRequest<DecodeTx>) -> Result<Value, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let decoded = codec::decode_raw(&request.body.raw_tx)?;
		serde_json::to_value(decoded).map_err(|e| ChainError::Protocol(format!("failed to encode decoded tx: {}", e)))
	}

	async fn verify_signed_tx(&self, request: &ChainRequest<VerifyTx>) -> Result<String, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let signer = codec::verify_raw(&request.body.raw_tx)?;
		if let Some(expected) = request.body.expected_sender.as_deref() {
			if expected.trim() != signer {
				return Err(ChainError::Integrity(format!(
					"signer {} does not match expected sender {}",
					signer, expected
				)));
			}
		}
		Ok(signer)
	}

	async fn extra_data(&self, request: &ChainRequest<ExtraData>) -> Result<Value, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let params = &request.body.params;
		match request.body.kind.as_str() {
			"health" => Ok(json!({ "status": self.client.get_health().await? })),
			"slot" => {
				let commitment = match params.get("commitment") {
					Some(value) => serde_json::from_value(value.clone())
						.map_err(|e| ChainError::InvalidInput(format!("invalid commitment: {}", e)))?,
					None => Commitment::Finalized,
				};
				Ok(json!({ "slot": self.client.get_slot(commitment).await? }))
			},
			"simulate" => {
				let options = SimulateOptions {
					sig_verify: params.get("sig_verify").and_then(Value::as_bool).unwrap_or(false),
					replace_recent_blockhash: params
						.get("replace_recent_blockhash")
						.and_then(Value::as_bool)
						.unwrap_or(false),
					..Default::default()
				};
				let result = self
					.client
					.simulate_transaction(required_str(params, "raw_tx")?, Some(options))
					.await?;
				Ok(json!(result))
			},
			other => Err(ChainError::NotImplemented(format!("extra data kind '{}'", other))),
		}
	}
}

/// Factory function to create a Solana adapter from configuration.
///
/// Configuration parameters:
/// - `network`, `rpc_url` (required)
/// - `request_timeout_seconds`, `dial_attempts`, `explorer_url`, `explorer_api_key` (optional)
pub fn create_solana_adapter(config: &toml::Value) -> Result<Box<dyn ChainAdapter>, AdapterError> {
	SolanaAdapterSchema::validate_config(config).map_err(|e| AdapterError::InvalidConfig(format!("solana: {}", e)))?;
	let settings: SolanaSettings = config
		.clone()
		.try_into()
		.map_err(|e| AdapterError::InvalidConfig(format!("solana: {}", e)))?;

	let adapter = tokio::task::block_in_place(|| {
		tokio::runtime::Handle::current().block_on(SolanaAdapter::connect(settings))
	})?;

	Ok(Box::new(adapter))
}

/// Registry for the Solana adapter implementation.
pub struct Registry;

impl wallet_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "solana";
	type Factory = crate::AdapterFactory;

	fn factory() -> Self::Factory {
		create_solana_adapter
	}
}

impl crate::AdapterRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use solana_sdk::signature::{Keypair, Signer};
	use wallet_rpc::RpcClient;
	use wallet_types::{ErrorKind, TransferKind, TxStatus};
	use wiremock::matchers::{body_partial_json, method};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	const BLOCKHASH: &str = "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N";

	fn adapter_for(server: &MockServer) -> SolanaAdapter {
		let rpc = RpcClient::new(&server.uri(), &RpcOptions::default()).unwrap();
		SolanaAdapter::new(SvmClient::new(rpc), "mainnet", None)
	}

	fn request<T>(body: T) -> ChainRequest<T> {
		ChainRequest::new(CHAIN_NAME, "mainnet", body)
	}

	fn reply(result: Value) -> ResponseTemplate {
		ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
	}

	fn signature(n: u8) -> String {
		let mut bytes = [0xCDu8; 64];
		bytes[63] = n;
		solana_sdk::signature::Signature::from(bytes).to_string()
	}

	fn transfer_json(sig: &str, slot: u64) -> Value {
		json!({
			"slot": slot,
			"blockTime": 1_700_000_000u64 + slot,
			"transaction": {
				"signatures": [sig],
				"message": {
					"accountKeys": [
						"A1iceA1iceA1iceA1iceA1iceA1iceA1iceA1iceA1i",
						"BobBobBobBobBobBobBobBobBobBobBobBobBobBobBo",
						wallet_svm::programs::SYSTEM_PROGRAM_ID
					],
					"instructions": [{"programIdIndex": 2, "accounts": [0, 1], "data": "3Bxs4h24hBtQy9rw"}],
					"recentBlockhash": BLOCKHASH
				}
			},
			"meta": {
				"err": null,
				"fee": 5000,
				"preBalances": [10_000_000u64, 0, 1],
				"postBalances": [8_995_000u64, 1_000_000u64, 1],
				"computeUnitsConsumed": 150
			}
		})
	}

	#[tokio::test]
	async fn test_network_mismatch_is_rejected() {
		let server = MockServer::start().await;
		Mock::given(method("POST")).respond_with(reply(json!(1))).expect(0).mount(&server).await;
		let adapter = adapter_for(&server);

		let wrong = ChainRequest::new(CHAIN_NAME, "devnet", HeaderByNumber { height: 5 });
		let err = adapter.header_by_number(&wrong).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvalidInput);
	}

	#[tokio::test]
	async fn test_account_uses_blockhash_as_sequence() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "getAccountInfo"})))
			.respond_with(reply(json!({
				"context": {"slot": 1},
				"value": {
					"lamports": 2_500_000_000u64,
					"owner": wallet_svm::programs::SYSTEM_PROGRAM_ID,
					"data": ["", "base64"],
					"executable": false,
					"rentEpoch": 0
				}
			})))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "getLatestBlockhash"})))
			.respond_with(reply(json!({
				"context": {"slot": 1},
				"value": {"blockhash": BLOCKHASH, "lastValidBlockHeight": 10}
			})))
			.mount(&server)
			.await;

		let query = request(AccountQuery {
			address: "A1iceA1iceA1iceA1iceA1iceA1iceA1iceA1iceA1i".into(),
			contract_address: None,
		});
		let account = adapter_for(&server).account(&query).await.unwrap();
		assert_eq!(account.balance, "2500000000");
		assert_eq!(account.sequence, BLOCKHASH);
	}

	#[tokio::test]
	async fn test_slot_range_skips_empty_slots() {
		let server = MockServer::start().await;
		let sig = signature(1);
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "getBlock", "params": [10]})))
			.respond_with(reply(json!({
				"blockhash": BLOCKHASH, "previousBlockhash": BLOCKHASH, "parentSlot": 9, "signatures": []
			})))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "getBlock", "params": [11]})))
			.respond_with(reply(json!({
				"blockhash": BLOCKHASH, "previousBlockhash": BLOCKHASH, "parentSlot": 10, "signatures": [sig]
			})))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "getTransaction"})))
			.respond_with(reply(transfer_json(&sig, 11)))
			.expect(1)
			.mount(&server)
			.await;

		let range = request(HeaderRange {
			start: "10".into(),
			end: "11".into(),
		});
		let result = adapter_for(&server).header_range(&range).await.unwrap();
		assert!(result.is_complete());
		assert_eq!(result.items.len(), 1);
		assert_eq!(result.items[0].number, 11);
		assert_eq!(result.items[0].hash, sig);
		assert_eq!(result.items[0].gas_used, 150);
	}

	#[tokio::test]
	async fn test_failed_slot_keeps_earlier_headers() {
		let server = MockServer::start().await;
		let sig = signature(2);
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "getBlock", "params": [20]})))
			.respond_with(reply(json!({
				"blockhash": BLOCKHASH, "previousBlockhash": BLOCKHASH, "parentSlot": 19, "signatures": [sig]
			})))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "getBlock", "params": [21]})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0", "id": 1,
				"error": {"code": -32007, "message": "Slot 21 was skipped"}
			})))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "getTransaction"})))
			.respond_with(reply(transfer_json(&sig, 20)))
			.mount(&server)
			.await;

		let range = request(HeaderRange {
			start: "20".into(),
			end: "21".into(),
		});
		let result = adapter_for(&server).header_range(&range).await.unwrap();
		assert!(!result.is_complete());
		assert_eq!(result.items.len(), 1);
		assert_eq!(result.items[0].number, 20);
	}

	#[tokio::test]
	async fn test_block_by_hash_resolves_slot_without_details() {
		let server = MockServer::start().await;
		let sig = signature(4);
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "getTransaction"})))
			.respond_with(reply(transfer_json(&sig, 40)))
			.expect(2)
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({
				"method": "getBlock",
				"params": [40, {"transactionDetails": "none"}]
			})))
			.respond_with(reply(json!({
				"blockhash": BLOCKHASH, "previousBlockhash": BLOCKHASH, "parentSlot": 39
			})))
			.expect(1)
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({
				"method": "getBlock",
				"params": [40, {"transactionDetails": "signatures"}]
			})))
			.respond_with(reply(json!({
				"blockhash": BLOCKHASH, "previousBlockhash": BLOCKHASH, "parentSlot": 39, "signatures": [sig]
			})))
			.expect(1)
			.mount(&server)
			.await;
		let adapter = adapter_for(&server);

		let block = adapter
			.block_by_hash(&request(BlockByHash {
				hash: sig.clone(),
				view_tx: false,
			}))
			.await
			.unwrap();
		assert_eq!(block.height, 40);
		assert_eq!(block.hash, BLOCKHASH);
		assert!(block.transactions.is_empty());

		let header = adapter.header_by_hash(&request(HeaderByHash { hash: sig })).await.unwrap();
		assert_eq!(header.number, 40);
		assert_eq!(header.extra["parent_slot"], "39");
		assert_eq!(header.extra["tx_count"], "1");
	}

	#[tokio::test]
	async fn test_range_bounds_are_guarded() {
		let server = MockServer::start().await;
		let adapter = adapter_for(&server);
		for (start, end) in [("0", "5"), ("10", "5"), ("1", "1001")] {
			let range = request(HeaderRange {
				start: start.into(),
				end: end.into(),
			});
			let err = adapter.header_range(&range).await.unwrap_err();
			assert_eq!(err.kind(), ErrorKind::InvalidInput, "{}..{}", start, end);
		}
	}

	#[tokio::test]
	async fn test_tx_by_hash_classifies_native_transfer() {
		let server = MockServer::start().await;
		let sig = signature(3);
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "getTransaction"})))
			.respond_with(reply(transfer_json(&sig, 30)))
			.mount(&server)
			.await;

		let tx = adapter_for(&server)
			.tx_by_hash(&request(TxByHash { hash: sig.clone() }))
			.await
			.unwrap();
		assert_eq!(tx.hash, sig);
		assert_eq!(tx.kind, TransferKind::Native);
		assert_eq!(tx.status, TxStatus::Success);
		assert_eq!(tx.amount, "1000000");
		assert_eq!(tx.fee, "5000");
		assert_eq!(tx.height, 30);
	}

	#[tokio::test]
	async fn test_fee_requires_message() {
		let server = MockServer::start().await;
		let err = adapter_for(&server).fee(&request(FeeQuery::default())).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvalidInput);
	}

	#[test]
	fn test_hex_message_is_reencoded() {
		assert_eq!(message_base64("0x010203").unwrap(), STANDARD.encode([1u8, 2, 3]));
		assert_eq!(message_base64("AQID").unwrap(), "AQID");
		assert!(message_base64("  ").is_err());
	}

	#[tokio::test]
	async fn test_native_transfer_signing_round_trip() {
		let server = MockServer::start().await;
		let adapter = adapter_for(&server);
		let payer = Keypair::new();
		let tx = TxStructure {
			from: payer.pubkey().to_string(),
			to: Keypair::new().pubkey().to_string(),
			value: "0.5".into(),
			nonce: BLOCKHASH.into(),
			..Default::default()
		};
		let base64_tx = tx.to_base64().unwrap();

		let unsigned = adapter
			.create_unsigned_tx(&request(UnsignedTx {
				base64_tx: base64_tx.clone(),
			}))
			.await
			.unwrap();
		let message = hex::decode(&unsigned.payload).unwrap();
		let signature = payer.sign_message(&message);

		let signed = adapter
			.build_signed_tx(&request(SignedTx {
				base64_tx,
				signature: hex::encode(signature.as_ref()),
			}))
			.await
			.unwrap();
		assert_eq!(signed.tx_hash, signature.to_string());

		let signer = adapter
			.verify_signed_tx(&request(VerifyTx {
				raw_tx: signed.raw_tx.clone(),
				expected_sender: Some(payer.pubkey().to_string()),
			}))
			.await
			.unwrap();
		assert_eq!(signer, payer.pubkey().to_string());

		let decoded = adapter.decode_tx(&request(DecodeTx { raw_tx: signed.raw_tx })).await.unwrap();
		assert_eq!(decoded["value"], "0.500000000");
		assert_eq!(decoded["nonce"], BLOCKHASH);
	}

	#[tokio::test]
	async fn test_unknown_extra_kind() {
		let server = MockServer::start().await;
		let extra = request(ExtraData {
			kind: "stake".into(),
			params: Value::Null,
		});
		let err = adapter_for(&server).extra_data(&extra).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::NotImplemented);
	}

	#[test]
	fn test_schema_checks_network() {
		let ok: toml::Value = toml::from_str(
			r#"
			network = "devnet"
			rpc_url = "https://api.devnet.solana.com"
			"#,
		)
		.unwrap();
		assert!(SolanaAdapterSchema::validate_config(&ok).is_ok());

		let bad: toml::Value = toml::from_str(
			r#"
			network = "localnet"
			rpc_url = "https://api.devnet.solana.com"
			"#,
		)
		.unwrap();
		assert!(SolanaAdapterSchema::validate_config(&bad).is_err());
	}

	#[tokio::test(flavor = "multi_thread")]
	async fn test_factory_dials_with_health_check() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "getHealth"})))
			.respond_with(reply(json!("ok")))
			.mount(&server)
			.await;
		let config: toml::Value = toml::from_str(&format!(
			r#"
			network = "mainnet"
			rpc_url = "{}"
			"#,
			server.uri()
		))
		.unwrap();

		let adapter = create_solana_adapter(&config).unwrap();
		assert_eq!(adapter.chain(), CHAIN_NAME);
	}
}
