//! Solana JSON-RPC client.
//!
//! Every response is checked in order: request failure, HTTP status, RPC
//! error object, then semantic emptiness (empty owner, empty blockhash,
//! zero slot) before it is accepted.

use crate::types::{
	AccountInfo, BlockResult, Commitment, HealthStatus, LatestBlockhash, PrioritizationFee, SendOptions,
	SignatureInfo, SignaturesQuery, SimulateOptions, SimulateResult, TokenAmount, TransactionDetails,
	TransactionResult, WithContext,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, warn};
use wallet_rpc::{decode_result, RpcClient, RpcOptions};
use wallet_types::{truncate_id, ChainError};

/// Upper bound accepted by `getBlocksWithLimit`.
pub const MAX_BLOCKS_LIMIT: u64 = 500_000;

const NODE_BEHIND: i64 = -32005;
const TRANSACTION_NOT_AVAILABLE: i64 = -32004;

/// Rejects signatures that cannot be a base58 transaction id.
pub fn validate_signature(signature: &str) -> Result<&str, ChainError> {
	let signature = signature.trim();
	if signature.is_empty() {
		return Err(ChainError::InvalidInput("empty signature".into()));
	}
	if !(88..=90).contains(&signature.len()) {
		return Err(ChainError::InvalidInput(format!(
			"invalid signature length: expected 88-90 chars, got {}",
			signature.len()
		)));
	}
	if bs58::decode(signature).into_vec().is_err() {
		return Err(ChainError::InvalidInput(format!(
			"signature is not base58: {}",
			truncate_id(signature)
		)));
	}
	Ok(signature)
}

fn require_address(address: &str) -> Result<&str, ChainError> {
	let address = address.trim();
	if address.is_empty() {
		return Err(ChainError::InvalidInput("empty address".into()));
	}
	Ok(address)
}

#[derive(Debug, Clone)]
pub struct SvmClient {
	rpc: RpcClient,
}

impl SvmClient {
	pub fn new(rpc: RpcClient) -> Self {
		Self { rpc }
	}

	/// Dials `url` with retries, using `getHealth` as the handshake.
	pub async fn dial(url: &str, options: &RpcOptions) -> Result<Self, ChainError> {
		let rpc = RpcClient::connect(url, options, "getHealth").await?;
		Ok(Self::new(rpc))
	}

	pub fn rpc(&self) -> &RpcClient {
		&self.rpc
	}

	/// Required, non-null result of `method`.
	async fn request<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, ChainError> {
		self.rpc.call(method, params).await.map_err(|e| {
			debug!(method, error = %e, "svm call failed");
			e
		})
	}

	pub async fn get_health(&self) -> Result<HealthStatus, ChainError> {
		let method = "getHealth";
		let envelope = self.rpc.call_envelope(method, json!([])).await?;
		if let Some(err) = envelope.error {
			if err.code == NODE_BEHIND {
				warn!(message = %err.message, "node is behind");
				return Ok(HealthStatus::Behind);
			}
			return Err(ChainError::from(err).context(method));
		}
		match envelope.result.as_ref().and_then(Value::as_str) {
			Some("ok") => Ok(HealthStatus::Ok),
			Some("behind") => Ok(HealthStatus::Behind),
			Some("") | None => Err(ChainError::Protocol(format!("{}: empty result", method))),
			Some(other) => Err(ChainError::Protocol(format!("{}: unknown health status: {}", method, other))),
		}
	}

	pub async fn get_account_info(&self, address: &str) -> Result<AccountInfo, ChainError> {
		let address = require_address(address)?;
		let method = "getAccountInfo";
		let reply: WithContext<Option<AccountInfo>> = self
			.request(method, json!([address, {"encoding": "base64"}]))
			.await?;
		let info = reply
			.value
			.ok_or_else(|| ChainError::NotFound(format!("account {}", address)))?;

		if info.owner.is_empty() {
			return Err(ChainError::Protocol(format!("{}: empty owner", method)));
		}
		match info.data.get(1).map(String::as_str) {
			Some("base64") => Ok(info),
			Some(other) => Err(ChainError::Protocol(format!(
				"{}: unexpected data encoding: {}",
				method, other
			))),
			None => Err(ChainError::Protocol(format!("{}: missing data encoding", method))),
		}
	}

	/// Lamports held by `address`.
	pub async fn get_balance(&self, address: &str) -> Result<u64, ChainError> {
		let address = require_address(address)?;
		let reply: WithContext<u64> = self.request("getBalance", json!([address])).await?;
		if reply.value == 0 {
			debug!(address, "account balance is zero");
		}
		Ok(reply.value)
	}

	pub async fn get_latest_blockhash(&self, commitment: Commitment) -> Result<String, ChainError> {
		let method = "getLatestBlockhash";
		let reply: WithContext<LatestBlockhash> =
			self.request(method, json!([{"commitment": commitment}])).await?;
		if reply.value.blockhash.is_empty() {
			return Err(ChainError::Protocol(format!("{}: empty blockhash", method)));
		}
		debug!(
			blockhash = %reply.value.blockhash,
			last_valid_block_height = reply.value.last_valid_block_height,
			"latest blockhash"
		);
		Ok(reply.value.blockhash)
	}

	/// Broadcasts a signed transaction and returns its signature.
	pub async fn send_transaction(
		&self,
		signed_tx: &str,
		options: Option<SendOptions>,
	) -> Result<String, ChainError> {
		if signed_tx.trim().is_empty() {
			return Err(ChainError::InvalidInput("empty transaction".into()));
		}
		let method = "sendTransaction";
		let options = options.unwrap_or_default();
		let signature: String = self
			.request(method, json!([signed_tx.trim(), options]))
			.await
			.map_err(|e| {
				error!(error = %e, "failed to send transaction");
				e
			})?;
		if signature.is_empty() {
			return Err(ChainError::Protocol(format!("{}: empty transaction signature returned", method)));
		}
		Ok(signature)
	}

	/// Executes a transaction against current state without broadcasting it.
	pub async fn simulate_transaction(
		&self,
		tx: &str,
		options: Option<SimulateOptions>,
	) -> Result<SimulateResult, ChainError> {
		if tx.trim().is_empty() {
			return Err(ChainError::InvalidInput("empty transaction".into()));
		}
		let method = "simulateTransaction";
		let options = options.unwrap_or_default();
		let reply: WithContext<SimulateResult> = self.request(method, json!([tx.trim(), options])).await?;
		let result = reply.value;

		if let Some(err) = result.err.as_ref().filter(|e| !e.is_null()) {
			return Err(ChainError::Protocol(format!("{}: simulation failed: {}", method, err)));
		}
		let no_logs = result.logs.as_ref().is_none_or(Vec::is_empty);
		if result.units_consumed.unwrap_or(0) == 0 && no_logs {
			return Err(ChainError::Protocol(format!("{}: empty simulation result", method)));
		}
		Ok(result)
	}

	/// Base fee in lamports for a base64 serialized message.
	pub async fn get_fee_for_message(&self, message: &str) -> Result<u64, ChainError> {
		if message.trim().is_empty() {
			return Err(ChainError::InvalidInput("empty message".into()));
		}
		let method = "getFeeForMessage";
		let reply: WithContext<Option<u64>> = self
			.request(method, json!([message.trim(), {"commitment": Commitment::Finalized}]))
			.await?;
		reply
			.value
			.ok_or_else(|| ChainError::Protocol(format!("{}: invalid message or unable to estimate fee", method)))
	}

	/// Recent per-slot prioritization fees. An empty list is a valid answer.
	pub async fn get_recent_prioritization_fees(&self) -> Result<Vec<PrioritizationFee>, ChainError> {
		let fees: Option<Vec<PrioritizationFee>> = self
			.rpc
			.call_optional("getRecentPrioritizationFees", json!([]))
			.await?;
		Ok(fees.unwrap_or_default())
	}

	pub async fn get_slot(&self, commitment: Commitment) -> Result<u64, ChainError> {
		let method = "getSlot";
		let slot: u64 = self.request(method, json!([{"commitment": commitment}])).await?;
		if slot == 0 {
			return Err(ChainError::Protocol(format!("{}: invalid slot number: got 0", method)));
		}
		Ok(slot)
	}

	/// Confirmed slots starting at `start_slot`, at most `limit` of them.
	pub async fn get_blocks_with_limit(&self, start_slot: u64, limit: u64) -> Result<Vec<u64>, ChainError> {
		if start_slot == 0 {
			return Err(ChainError::InvalidInput("start slot cannot be 0".into()));
		}
		if limit == 0 {
			return Err(ChainError::InvalidInput("limit cannot be 0".into()));
		}
		if limit > MAX_BLOCKS_LIMIT {
			return Err(ChainError::InvalidInput(format!(
				"limit must not exceed {} blocks",
				MAX_BLOCKS_LIMIT
			)));
		}

		let method = "getBlocksWithLimit";
		let slots: Vec<u64> = self
			.rpc
			.call_optional(method, json!([start_slot, limit]))
			.await?
			.unwrap_or_default();
		if slots.is_empty() {
			warn!(start_slot, limit, "no blocks found in slot range");
		}
		if slots.len() as u64 > limit {
			return Err(ChainError::Protocol(format!(
				"{}: received more blocks than requested: got {}, want <= {}",
				method,
				slots.len(),
				limit
			)));
		}
		Ok(slots)
	}

	/// Block at `slot` with the requested transaction detail level.
	///
	/// `full` blocks are requested as `jsonParsed` so that token movements
	/// in inner instructions can be classified.
	pub async fn get_block_by_slot(
		&self,
		slot: u64,
		details: TransactionDetails,
	) -> Result<BlockResult, ChainError> {
		let encoding = match details {
			TransactionDetails::Full => "jsonParsed",
			_ => "json",
		};
		let config = json!({
			"commitment": Commitment::Finalized,
			"encoding": encoding,
			"maxSupportedTransactionVersion": 0,
			"transactionDetails": details,
			"rewards": false,
		});
		self.request("getBlock", json!([slot, config]))
			.await
			.map_err(|e| e.context(format!("slot {}", slot)))
	}

	/// Block containing the transaction with `signature`, returned with its slot.
	pub async fn get_block_by_hash(
		&self,
		signature: &str,
		details: TransactionDetails,
	) -> Result<(u64, BlockResult), ChainError> {
		let tx = self.get_transaction(signature).await?;
		let block = self.get_block_by_slot(tx.slot, details).await?;
		Ok((tx.slot, block))
	}

	pub async fn get_transaction(&self, signature: &str) -> Result<TransactionResult, ChainError> {
		let signature = validate_signature(signature)?;
		let method = "getTransaction";
		let config = json!({
			"encoding": "jsonParsed",
			"commitment": Commitment::Finalized,
			"maxSupportedTransactionVersion": 0,
		});
		let envelope = self.rpc.call_envelope(method, json!([signature, config])).await?;
		if let Some(err) = envelope.error {
			if err.code == TRANSACTION_NOT_AVAILABLE {
				return Err(ChainError::NotFound(format!("transaction {}", signature)));
			}
			return Err(ChainError::from(err).context(method));
		}
		let value = match envelope.result {
			Some(value) if !value.is_null() => value,
			_ => return Err(ChainError::NotFound(format!("transaction {}", signature))),
		};
		let tx: TransactionResult = decode_result(method, value)?;
		if tx.transaction.signatures.is_empty() {
			return Err(ChainError::Protocol(format!("{}: empty transaction data", method)));
		}
		Ok(tx)
	}

	pub async fn get_signatures_for_address(
		&self,
		address: &str,
		commitment: Commitment,
		query: &SignaturesQuery,
	) -> Result<Vec<SignatureInfo>, ChainError> {
		let address = require_address(address)?;
		let method = "getSignaturesForAddress";
		let mut config = serde_json::to_value(query)
			.map_err(|e| ChainError::InvalidInput(format!("invalid signatures query: {}", e)))?;
		config["commitment"] = json!(commitment);
		self.rpc
			.call_optional(method, json!([address, config]))
			.await?
			.ok_or_else(|| ChainError::Protocol(format!("{}: empty signatures data", method)))
	}

	/// Supply and decimal precision of a token mint.
	pub async fn get_token_supply(&self, mint: &str) -> Result<TokenAmount, ChainError> {
		let mint = require_address(mint)?;
		let reply: WithContext<TokenAmount> = self
			.request("getTokenSupply", json!([mint, {"commitment": Commitment::Finalized}]))
			.await?;
		Ok(reply.value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::signature;
	use wallet_types::ErrorKind;
	use wiremock::matchers::{body_partial_json, method};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn client_for(server: &MockServer) -> SvmClient {
		SvmClient::new(RpcClient::new(&server.uri(), &RpcOptions::default()).unwrap())
	}

	async fn mount(server: &MockServer, rpc_method: &str, body: Value) {
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": rpc_method})))
			.respond_with(ResponseTemplate::new(200).set_body_json(body))
			.mount(server)
			.await;
	}

	#[tokio::test]
	async fn test_short_signature_rejected_before_http() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200))
			.expect(0)
			.mount(&server)
			.await;

		let err = client_for(&server).get_transaction("ab").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvalidInput);
	}

	#[test]
	fn test_validate_signature() {
		let sig = signature(1);
		assert_eq!(sig.len(), 88);
		assert_eq!(validate_signature(&format!("  {}\n", sig)).unwrap(), sig);
		assert!(validate_signature("").is_err());
		let not_base58 = "0".repeat(88);
		assert!(validate_signature(&not_base58).is_err());
	}

	#[tokio::test]
	async fn test_health_behind_is_a_status() {
		let server = MockServer::start().await;
		mount(
			&server,
			"getHealth",
			json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32005, "message": "Node is behind by 42 slots"}}),
		)
		.await;

		assert_eq!(client_for(&server).get_health().await.unwrap(), HealthStatus::Behind);
	}

	#[tokio::test]
	async fn test_health_unknown_status() {
		let server = MockServer::start().await;
		mount(&server, "getHealth", json!({"jsonrpc": "2.0", "id": 1, "result": "degraded"})).await;

		let err = client_for(&server).get_health().await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Protocol);
	}

	#[tokio::test]
	async fn test_account_info_checks() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"params": ["Missing1111111111111111111111111111111111"]})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0", "id": 1, "result": {"context": {"slot": 1}, "value": null}
			})))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"params": ["NoOwner111111111111111111111111111111111111"]})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0", "id": 1, "result": {"context": {"slot": 1}, "value": {
					"lamports": 5, "owner": "", "data": ["", "base64"], "executable": false, "rentEpoch": 0
				}}
			})))
			.mount(&server)
			.await;
		let client = client_for(&server);

		let err = client
			.get_account_info("Missing1111111111111111111111111111111111")
			.await
			.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::NotFound);

		let err = client
			.get_account_info("NoOwner111111111111111111111111111111111111")
			.await
			.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Protocol);
		assert!(err.to_string().contains("empty owner"));

		let err = client.get_account_info("   ").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvalidInput);
	}

	#[tokio::test]
	async fn test_semantic_emptiness_is_protocol_error() {
		let server = MockServer::start().await;
		mount(
			&server,
			"getLatestBlockhash",
			json!({"jsonrpc": "2.0", "id": 1, "result": {"context": {"slot": 1}, "value": {"blockhash": "", "lastValidBlockHeight": 9}}}),
		)
		.await;
		mount(&server, "getSlot", json!({"jsonrpc": "2.0", "id": 1, "result": 0})).await;
		let client = client_for(&server);

		let err = client.get_latest_blockhash(Commitment::Finalized).await.unwrap_err();
		assert!(err.to_string().contains("empty blockhash"));
		let err = client.get_slot(Commitment::Finalized).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Protocol);
	}

	#[tokio::test]
	async fn test_http_error_precedes_rpc_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(503).set_body_json(json!({
				"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "overloaded"}
			})))
			.mount(&server)
			.await;

		let err = client_for(&server).get_balance("Addr1111111111111111111111111111111111111111").await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Transport);
	}

	#[tokio::test]
	async fn test_blocks_with_limit_validation() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": [5, 6, 7]})))
			.mount(&server)
			.await;
		let client = client_for(&server);

		assert_eq!(client.get_blocks_with_limit(0, 10).await.unwrap_err().kind(), ErrorKind::InvalidInput);
		assert_eq!(client.get_blocks_with_limit(5, 0).await.unwrap_err().kind(), ErrorKind::InvalidInput);
		assert_eq!(
			client.get_blocks_with_limit(5, MAX_BLOCKS_LIMIT + 1).await.unwrap_err().kind(),
			ErrorKind::InvalidInput
		);
		assert_eq!(client.get_blocks_with_limit(5, 3).await.unwrap(), vec![5, 6, 7]);
		assert_eq!(client.get_blocks_with_limit(5, 2).await.unwrap_err().kind(), ErrorKind::Protocol);
	}

	#[tokio::test]
	async fn test_transaction_not_available() {
		let server = MockServer::start().await;
		mount(
			&server,
			"getTransaction",
			json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32004, "message": "Block not available for slot 12"}}),
		)
		.await;

		let err = client_for(&server).get_transaction(&signature(3)).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::NotFound);
	}

	#[tokio::test]
	async fn test_empty_prioritization_fees() {
		let server = MockServer::start().await;
		mount(&server, "getRecentPrioritizationFees", json!({"jsonrpc": "2.0", "id": 1, "result": []})).await;

		assert!(client_for(&server).get_recent_prioritization_fees().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_signatures_query_params() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({
				"method": "getSignaturesForAddress",
				"params": ["Addr1111111111111111111111111111111111111111", {"limit": 2, "commitment": "finalized"}]
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0", "id": 1, "result": [
					{"signature": signature(1), "slot": 10, "err": null, "memo": null, "blockTime": 1700000000, "confirmationStatus": "finalized"}
				]
			})))
			.mount(&server)
			.await;

		let query = SignaturesQuery {
			limit: Some(2),
			..Default::default()
		};
		let sigs = client_for(&server)
			.get_signatures_for_address("Addr1111111111111111111111111111111111111111", Commitment::Finalized, &query)
			.await
			.unwrap();
		assert_eq!(sigs.len(), 1);
		assert_eq!(sigs[0].slot, 10);
	}
}
