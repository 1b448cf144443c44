//! Ethereum adapter backed by the EVM JSON-RPC client.

use crate::explorer::{EtherscanClient, ExplorerInterface, HistoryQuery};
use crate::{AdapterError, ChainAdapter};
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};
use wallet_evm::client::EvmClient;
use wallet_evm::codec::{self, Eip1559DynamicFeeTx};
use wallet_evm::fee;
use wallet_evm::types::BlockTransactionEntry;
use wallet_evm::{RpcBlock, RpcTransaction};
use wallet_rpc::RpcOptions;
use wallet_types::{
	AccountKind, AccountQuery, Block, BlockByHash, BlockByNumber, BlockHeader, BlockTransaction, ChainAccount,
	ChainError, ChainRequest, ConfigSchema, ConvertAddress, DecodeTx, ErrorKind, ExtraData, FeeQuery, FeeQuote,
	Field, FieldType, HeaderByHash, HeaderByNumber, HeaderRange, RangeResult, Schema, SendTx, SignedTransaction,
	SignedTx, TransferKind, TxByAddress, TxByHash, TxMessage, TxStatus, UnsignedTransaction, UnsignedTx,
	ValidateAddress, ValidationError, VerifyTx,
};

pub const CHAIN_NAME: &str = "Ethereum";

/// Widest header range served in one request.
pub const MAX_BLOCK_RANGE: u64 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct EthereumSettings {
	pub network: String,
	pub chain_id: u64,
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
	10
}

fn default_dial_attempts() -> u32 {
	5
}

pub struct EthereumAdapter {
	client: EvmClient,
	chain_id: u64,
	network: String,
	explorer: Option<Box<dyn ExplorerInterface>>,
}

impl EthereumAdapter {
	pub fn new(
		client: EvmClient,
		chain_id: u64,
		network: impl Into<String>,
		explorer: Option<Box<dyn ExplorerInterface>>,
	) -> Self {
		Self {
			client,
			chain_id,
			network: network.into(),
			explorer,
		}
	}

	/// Dials the configured node.
	pub async fn connect(settings: EthereumSettings) -> Result<Self, AdapterError> {
		let options = RpcOptions {
			request_timeout: Duration::from_secs(settings.request_timeout_seconds),
			dial_attempts: settings.dial_attempts,
			..Default::default()
		};
		let client = EvmClient::dial(&settings.rpc_url, &options).await?;
		let explorer = match &settings.explorer_url {
			Some(url) => Some(Box::new(EtherscanClient::new(url.clone(), settings.explorer_api_key.clone())?)
				as Box<dyn ExplorerInterface>),
			None => None,
		};
		info!(
			chain_id = settings.chain_id,
			network = %settings.network,
			explorer = explorer.is_some(),
			"ethereum adapter ready"
		);
		Ok(Self::new(client, settings.chain_id, settings.network, explorer))
	}

	fn block_from_rpc(block: RpcBlock) -> Block {
		let height = block.number.to::<u64>();
		let transactions = block
			.transactions
			.into_iter()
			.filter_map(|entry| match entry {
				BlockTransactionEntry::Full(tx) => Some(block_transaction(tx, height)),
				BlockTransactionEntry::Hash(_) => None,
			})
			.collect();
		Block {
			hash: block.hash.to_string(),
			height,
			base_fee: block.base_fee_per_gas.map(|fee| fee.to_string()),
			transactions,
		}
	}

	/// Classifies a looked-up transaction. A destination holding code is a
	/// contract call unless the call data is an ERC-20 `transfer`.
	async fn classify(&self, tx: &RpcTransaction) -> Result<(TransferKind, String, String, Option<String>), ChainError> {
		if let Some((recipient, amount)) = codec::decode_erc20_transfer(&tx.input) {
			let contract = tx.to.map(|c| c.to_checksum(None));
			return Ok((
				TransferKind::FungibleToken,
				recipient.to_checksum(None),
				amount.to_string(),
				contract,
			));
		}
		let Some(to) = tx.to else {
			return Ok((TransferKind::ContractCall, String::new(), tx.value.to_string(), None));
		};
		let kind = match self.client.code_kind(to).await? {
			AccountKind::Contract => TransferKind::ContractCall,
			AccountKind::Eoa => TransferKind::Native,
		};
		let contract = (kind == TransferKind::ContractCall).then(|| to.to_checksum(None));
		Ok((kind, to.to_checksum(None), tx.value.to_string(), contract))
	}
}

fn block_transaction(tx: RpcTransaction, height: u64) -> BlockTransaction {
	let target = tx.to.map(|c| c.to_checksum(None));
	let (to, amount, token_address, kind) = match codec::decode_erc20_transfer(&tx.input) {
		Some((recipient, amount)) => (
			recipient.to_checksum(None),
			amount.to_string(),
			target.clone(),
			TransferKind::FungibleToken,
		),
		None if tx.input.is_empty() => (
			target.clone().unwrap_or_default(),
			tx.value.to_string(),
			None,
			TransferKind::Native,
		),
		None => (
			target.clone().unwrap_or_default(),
			tx.value.to_string(),
			None,
			TransferKind::ContractCall,
		),
	};
	BlockTransaction {
		hash: tx.hash.to_string(),
		from: tx.from.to_checksum(None),
		to,
		amount,
		token_address,
		contract_wallet: target.filter(|_| kind != TransferKind::Native),
		height,
		kind,
	}
}

fn parse_hash(field: &str, value: &str) -> Result<B256, ChainError> {
	B256::from_str(value.trim())
		.map_err(|e| ChainError::InvalidInput(format!("invalid {} '{}': {}", field, value, e)))
}

fn parse_address(field: &str, value: &str) -> Result<Address, ChainError> {
	Address::from_str(value.trim())
		.map_err(|e| ChainError::InvalidInput(format!("invalid {} '{}': {}", field, value, e)))
}

fn parse_height(field: &str, value: &str) -> Result<u64, ChainError> {
	value
		.trim()
		.parse()
		.map_err(|e| ChainError::InvalidInput(format!("invalid {} '{}': {}", field, value, e)))
}

/// Zero selects the latest block.
fn height_selector(height: u64) -> Option<u64> {
	(height != 0).then_some(height)
}

/// Configuration schema for the Ethereum adapter.
pub struct EthereumAdapterSchema;

impl EthereumAdapterSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for EthereumAdapterSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("network", FieldType::String),
				Field::new(
					"chain_id",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
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
impl ChainAdapter for EthereumAdapter {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(EthereumAdapterSchema)
	}

	fn chain(&self) -> &str {
		CHAIN_NAME
	}

	fn network(&self) -> &str {
		&self.network
	}

	async fn convert_address(&self, request: &ChainRequest<ConvertAddress>) -> Result<String, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		codec::public_key_to_address(&request.body.public_key).map(|a| a.to_checksum(None))
	}

	async fn validate_address(&self, request: &ChainRequest<ValidateAddress>) -> Result<bool, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		Ok(codec::is_valid_address(&request.body.address))
	}

	async fn block_by_number(&self, request: &ChainRequest<BlockByNumber>) -> Result<Block, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let block = self
			.client
			.block_by_number(height_selector(request.body.height), request.body.view_tx)
			.await?;
		Ok(Self::block_from_rpc(block))
	}

	async fn block_by_hash(&self, request: &ChainRequest<BlockByHash>) -> Result<Block, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let hash = parse_hash("hash", &request.body.hash)?;
		let block = self.client.block_by_hash(hash, request.body.view_tx).await?;
		Ok(Self::block_from_rpc(block))
	}

	async fn header_by_number(&self, request: &ChainRequest<HeaderByNumber>) -> Result<BlockHeader, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let header = self.client.header_by_number(height_selector(request.body.height)).await?;
		Ok(header.to_block_header())
	}

	async fn header_by_hash(&self, request: &ChainRequest<HeaderByHash>) -> Result<BlockHeader, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let hash = parse_hash("hash", &request.body.hash)?;
		let header = self.client.header_by_hash(hash).await?;
		Ok(header.to_block_header())
	}

	async fn header_range(
		&self,
		request: &ChainRequest<HeaderRange>,
	) -> Result<RangeResult<BlockHeader>, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let start = parse_height("start", &request.body.start)?;
		let end = parse_height("end", &request.body.end)?;
		if end < start {
			return Err(ChainError::InvalidInput(format!(
				"range end {} is before start {}",
				end, start
			)));
		}
		if end - start >= MAX_BLOCK_RANGE {
			return Err(ChainError::InvalidInput(format!(
				"range of {} blocks exceeds maximum {}",
				end - start + 1,
				MAX_BLOCK_RANGE
			)));
		}

		let result = self.client.headers_by_range(start, end, self.chain_id).await;
		if let Some(err) = &result.error {
			warn!(start, end, fetched = result.items.len(), error = %err, "header range incomplete");
		}
		Ok(RangeResult {
			items: result.items.iter().map(|h| h.to_block_header()).collect(),
			error: result.error,
		})
	}

	async fn account(&self, request: &ChainRequest<AccountQuery>) -> Result<ChainAccount, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		if request
			.body
			.contract_address
			.as_deref()
			.is_some_and(|c| !codec::is_native_contract(c))
		{
			return Err(ChainError::not_implemented("token balance lookup"));
		}
		let address = parse_address("address", &request.body.address)?;
		let (balance, nonce) = tokio::try_join!(self.client.balance(address), self.client.tx_count(address))?;
		Ok(ChainAccount {
			address: address.to_checksum(None),
			balance: balance.to_string(),
			sequence: nonce.to_string(),
			network: self.network.clone(),
		})
	}

	async fn fee(&self, request: &ChainRequest<FeeQuery>) -> Result<FeeQuote, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		fee::suggest_fee(&self.client).await
	}

	async fn send_tx(&self, request: &ChainRequest<SendTx>) -> Result<String, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let hash = self.client.send_raw_transaction(&request.body.raw_tx).await?;
		Ok(hash.to_string())
	}

	async fn tx_by_address(&self, request: &ChainRequest<TxByAddress>) -> Result<Vec<TxMessage>, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let explorer = self
			.explorer
			.as_ref()
			.ok_or_else(|| ChainError::not_implemented("tx_by_address without explorer"))?;
		let query = HistoryQuery {
			address: request.body.address.clone(),
			contract_address: request.body.contract_address.clone(),
			page: request.body.page,
			page_size: request.body.page_size,
		};
		explorer.transactions_by_address(&query).await
	}

	async fn tx_by_hash(&self, request: &ChainRequest<TxByHash>) -> Result<TxMessage, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let hash = parse_hash("hash", &request.body.hash)?;
		let tx = self.client.tx_by_hash(hash).await?;
		let receipt = match self.client.tx_receipt_by_hash(hash).await {
			Ok(receipt) => Some(receipt),
			Err(e) if e.kind() == ErrorKind::NotFound => None,
			Err(e) => return Err(e),
		};
		let (kind, to, amount, contract_address) = self.classify(&tx).await?;
		let to = match (&receipt, to.is_empty()) {
			(Some(r), true) => r.contract_address.map(|c| c.to_checksum(None)).unwrap_or_default(),
			_ => to,
		};
		let (status, fee) = match &receipt {
			Some(r) if r.succeeded() => (TxStatus::Success, r.fee().to_string()),
			Some(r) => (TxStatus::Failed, r.fee().to_string()),
			None => (TxStatus::Pending, "0".to_string()),
		};
		debug!(tx_hash = %hash, ?kind, ?status, "classified transaction");
		Ok(TxMessage {
			hash: tx.hash.to_string(),
			from: tx.from.to_checksum(None),
			to,
			amount,
			fee,
			status,
			kind,
			contract_address,
			height: tx.block_number.map(|n| n.to::<u64>()).unwrap_or_default(),
		})
	}

	async fn create_unsigned_tx(
		&self,
		request: &ChainRequest<UnsignedTx>,
	) -> Result<UnsignedTransaction, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let tx = Eip1559DynamicFeeTx::from_base64(&request.body.base64_tx)?;
		codec::build_unsigned(&tx)
	}

	async fn build_signed_tx(&self, request: &ChainRequest<SignedTx>) -> Result<SignedTransaction, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let tx = Eip1559DynamicFeeTx::from_base64(&request.body.base64_tx)?;
		codec::attach_signature(&tx, &request.body.signature)
	}

	async fn decode_tx(&self, request: &ChainRequest<DecodeTx>) -> Result<Value, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let decoded = codec::decode_raw(&request.body.raw_tx)?;
		serde_json::to_value(decoded).map_err(|e| ChainError::Protocol(format!("failed to encode decoded tx: {}", e)))
	}

	async fn verify_signed_tx(&self, request: &ChainRequest<VerifyTx>) -> Result<String, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let signer = codec::verify_raw(&request.body.raw_tx, request.body.expected_sender.as_deref())?;
		Ok(signer.to_checksum(None))
	}

	async fn extra_data(&self, request: &ChainRequest<ExtraData>) -> Result<Value, ChainError> {
		request.ensure_target(CHAIN_NAME, &self.network)?;
		let params = &request.body.params;
		let address = || {
			params
				.get("address")
				.and_then(Value::as_str)
				.ok_or_else(|| ChainError::InvalidInput("missing 'address' parameter".into()))
				.and_then(|a| parse_address("address", a))
		};
		match request.body.kind.as_str() {
			"storage_hash" => {
				let block = params.get("block").and_then(Value::as_u64);
				let hash = self.client.storage_hash(address()?, block).await?;
				Ok(json!({ "storage_hash": hash }))
			},
			"code_kind" => {
				let kind = self.client.code_kind(address()?).await?;
				Ok(json!({ "kind": kind }))
			},
			"safe_header" => Ok(json!(self.client.latest_safe_header().await?.to_block_header())),
			"finalized_header" => Ok(json!(self.client.latest_finalized_header().await?.to_block_header())),
			other => Err(ChainError::NotImplemented(format!("extra data kind '{}'", other))),
		}
	}
}

/// Factory function to create an Ethereum adapter from configuration.
///
/// Configuration parameters:
/// - `network`, `chain_id`, `rpc_url` (required)
/// - `request_timeout_seconds`, `dial_attempts`, `explorer_url`, `explorer_api_key` (optional)
pub fn create_ethereum_adapter(config: &toml::Value) -> Result<Box<dyn ChainAdapter>, AdapterError> {
	EthereumAdapterSchema::validate_config(config)
		.map_err(|e| AdapterError::InvalidConfig(format!("ethereum: {}", e)))?;
	let settings: EthereumSettings = config
		.clone()
		.try_into()
		.map_err(|e| AdapterError::InvalidConfig(format!("ethereum: {}", e)))?;

	// Dialing is async; factories are not.
	let adapter = tokio::task::block_in_place(|| {
		tokio::runtime::Handle::current().block_on(EthereumAdapter::connect(settings))
	})?;

	Ok(Box::new(adapter))
}

/// Registry for the Ethereum adapter implementation.
pub struct Registry;

impl wallet_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "ethereum";
	type Factory = crate::AdapterFactory;

	fn factory() -> Self::Factory {
		create_ethereum_adapter
	}
}

impl crate::AdapterRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_consensus::Header;
	use alloy_signer::SignerSync;
	use alloy_signer_local::PrivateKeySigner;
	use wallet_rpc::RpcClient;
	use wiremock::matchers::{body_partial_json, method};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn adapter_for(server: &MockServer, chain_id: u64) -> EthereumAdapter {
		let rpc = RpcClient::new(&server.uri(), &RpcOptions::default()).unwrap();
		EthereumAdapter::new(EvmClient::new(rpc), chain_id, "mainnet", None)
	}

	fn request<T>(body: T) -> ChainRequest<T> {
		ChainRequest::new(CHAIN_NAME, "mainnet", body)
	}

	fn reply(result: Value) -> ResponseTemplate {
		ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
	}

	#[tokio::test]
	async fn test_mismatched_chain_fails_before_network() {
		let server = MockServer::start().await;
		Mock::given(method("POST")).respond_with(reply(json!("0x0"))).expect(0).mount(&server).await;
		let adapter = adapter_for(&server, 1);

		let wrong = ChainRequest::new("Solana", "mainnet", FeeQuery::default());
		let err = adapter.fee(&wrong).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvalidInput);
	}

	#[tokio::test]
	async fn test_single_height_range_uses_header_path() {
		let server = MockServer::start().await;
		let header = Header {
			number: 100,
			timestamp: 1_700_000_100,
			..Default::default()
		};
		let mut value = serde_json::to_value(&header).unwrap();
		value["hash"] = json!(header.hash_slow());
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "eth_getBlockByNumber", "params": ["0x64", false]})))
			.respond_with(reply(value))
			.expect(1)
			.mount(&server)
			.await;

		let range = request(HeaderRange {
			start: "100".into(),
			end: "100".into(),
		});
		let result = adapter_for(&server, 1).header_range(&range).await.unwrap();
		assert!(result.is_complete());
		assert_eq!(result.items.len(), 1);
		assert_eq!(result.items[0].number, 100);
	}

	#[tokio::test]
	async fn test_range_bounds_are_guarded() {
		let server = MockServer::start().await;
		let adapter = adapter_for(&server, 1);
		for (start, end) in [("10", "5"), ("0", "1000"), ("x", "5")] {
			let range = request(HeaderRange {
				start: start.into(),
				end: end.into(),
			});
			let err = adapter.header_range(&range).await.unwrap_err();
			assert_eq!(err.kind(), ErrorKind::InvalidInput, "{}..{}", start, end);
		}
	}

	#[tokio::test]
	async fn test_account_reports_nonce_as_sequence() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "eth_getBalance"})))
			.respond_with(reply(json!("0xde0b6b3a7640000")))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "eth_getTransactionCount"})))
			.respond_with(reply(json!("0x2a")))
			.mount(&server)
			.await;

		let query = request(AccountQuery {
			address: "0x000000000000000000000000000000000000dEaD".into(),
			contract_address: None,
		});
		let account = adapter_for(&server, 1).account(&query).await.unwrap();
		assert_eq!(account.balance, "1000000000000000000");
		assert_eq!(account.sequence, "42");
		assert_eq!(account.network, "mainnet");
	}

	#[tokio::test]
	async fn test_unsigned_then_signed_round_trip() {
		let server = MockServer::start().await;
		let adapter = adapter_for(&server, 1);
		let signer = PrivateKeySigner::random();
		let tx = Eip1559DynamicFeeTx {
			chain_id: "1".into(),
			nonce: 3,
			from_address: signer.address().to_checksum(None),
			to_address: "0x000000000000000000000000000000000000dEaD".into(),
			gas_limit: 21_000,
			max_fee_per_gas: "30000000000".into(),
			max_priority_fee_per_gas: "1000000000".into(),
			amount: "1000".into(),
			..Default::default()
		};
		let base64_tx = tx.to_base64().unwrap();

		let unsigned = adapter
			.create_unsigned_tx(&request(UnsignedTx {
				base64_tx: base64_tx.clone(),
			}))
			.await
			.unwrap();
		let hash = parse_hash("payload", &unsigned.payload).unwrap();
		let signature = signer.sign_hash_sync(&hash).unwrap();

		let signed = adapter
			.build_signed_tx(&request(SignedTx {
				base64_tx,
				signature: hex::encode(signature.as_bytes()),
			}))
			.await
			.unwrap();
		let signer_address = adapter
			.verify_signed_tx(&request(VerifyTx {
				raw_tx: signed.raw_tx.clone(),
				expected_sender: Some(signer.address().to_checksum(None)),
			}))
			.await
			.unwrap();
		assert_eq!(signer_address, signer.address().to_checksum(None));

		let decoded = adapter.decode_tx(&request(DecodeTx { raw_tx: signed.raw_tx })).await.unwrap();
		assert_eq!(decoded["amount"], "1000");
		assert_eq!(decoded["kind"], "native");
	}

	#[tokio::test]
	async fn test_history_requires_explorer() {
		let server = MockServer::start().await;
		let query = request(TxByAddress {
			address: "0x000000000000000000000000000000000000dEaD".into(),
			contract_address: None,
			page: 1,
			page_size: 10,
		});
		let err = adapter_for(&server, 1).tx_by_address(&query).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::NotImplemented);
	}

	#[test]
	fn test_schema_rejects_bad_tables() {
		let ok: toml::Value = toml::from_str(
			r#"
			network = "mainnet"
			chain_id = 1
			rpc_url = "http://127.0.0.1:8545"
			"#,
		)
		.unwrap();
		assert!(EthereumAdapterSchema::validate_config(&ok).is_ok());

		let missing: toml::Value = toml::from_str(r#"network = "mainnet""#).unwrap();
		assert!(EthereumAdapterSchema::validate_config(&missing).is_err());

		let bad_url: toml::Value = toml::from_str(
			r#"
			network = "mainnet"
			chain_id = 1
			rpc_url = "ws://127.0.0.1:8546"
			"#,
		)
		.unwrap();
		assert!(EthereumAdapterSchema::validate_config(&bad_url).is_err());
	}

	#[tokio::test(flavor = "multi_thread")]
	async fn test_factory_dials_configured_node() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "eth_chainId"})))
			.respond_with(reply(json!("0x1")))
			.mount(&server)
			.await;
		let config: toml::Value = toml::from_str(&format!(
			r#"
			network = "mainnet"
			chain_id = 1
			rpc_url = "{}"
			"#,
			server.uri()
		))
		.unwrap();

		let adapter = create_ethereum_adapter(&config).unwrap();
		assert_eq!(adapter.chain(), CHAIN_NAME);
		assert_eq!(adapter.network(), "mainnet");
	}
}
