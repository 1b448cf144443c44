//! EVM JSON-RPC client.
//!
//! Every method issues its calls under the transport's per-call deadline and
//! wraps failures with the RPC method that produced them. A `null` result
//! for an existence query surfaces as [`ChainError::NotFound`].

use crate::types::{AccountProof, BlockNumber, EvmHeader, FilterQuery, Logs, RpcBlock, RpcLog, RpcReceipt, RpcTransaction};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde_json::{json, Value};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use wallet_rpc::{decode_result, BatchCall, RpcClient, RpcOptions};
use wallet_types::{truncate_id, with_0x_prefix, AccountKind, ChainError, RangeResult};

/// ZkFair mainnet and ZkFair Sepolia reject large batch requests.
pub const RESTRICTED_BATCH_CHAIN_IDS: [u64; 2] = [42766, 43851];

/// Heights fetched per task on restricted chains.
const RANGE_GROUP_SIZE: u64 = 100;

/// `eth_getLogs` gets a longer deadline than ordinary calls.
const FILTER_TIMEOUT_FACTOR: u32 = 10;

pub fn is_restricted_batch_chain(chain_id: u64) -> bool {
	RESTRICTED_BATCH_CHAIN_IDS.contains(&chain_id)
}

#[derive(Debug, Clone)]
pub struct EvmClient {
	rpc: RpcClient,
}

impl EvmClient {
	pub fn new(rpc: RpcClient) -> Self {
		Self { rpc }
	}

	/// Dials `url` with retries, using `eth_chainId` as the handshake.
	pub async fn dial(url: &str, options: &RpcOptions) -> Result<Self, ChainError> {
		let rpc = RpcClient::connect(url, options, "eth_chainId").await?;
		Ok(Self::new(rpc))
	}

	pub fn rpc(&self) -> &RpcClient {
		&self.rpc
	}

	async fn header_at(&self, block: BlockNumber) -> Result<EvmHeader, ChainError> {
		let method = "eth_getBlockByNumber";
		let raw: Option<Value> = self
			.rpc
			.call_optional(method, json!([block.to_arg(), false]))
			.await
			.map_err(|e| {
				error!(method, block = %block.to_arg(), error = %e, "header lookup failed");
				e
			})?;
		match raw {
			Some(value) => EvmHeader::from_rpc(value).map_err(|e| e.context(method)),
			None => {
				warn!(block = %block.to_arg(), "header not found");
				Err(ChainError::NotFound(format!("header {}", block.to_arg())))
			},
		}
	}

	/// Header at `number`, or the latest header when `None`.
	pub async fn header_by_number(&self, number: Option<u64>) -> Result<EvmHeader, ChainError> {
		self.header_at(BlockNumber::from_height(number)).await
	}

	/// Header with the given hash. The header is re-hashed locally and must
	/// match the requested hash.
	pub async fn header_by_hash(&self, hash: B256) -> Result<EvmHeader, ChainError> {
		let method = "eth_getBlockByHash";
		let value: Value = self
			.rpc
			.call_optional(method, json!([hash, false]))
			.await?
			.ok_or_else(|| ChainError::NotFound(format!("header {}", hash)))?;
		let header = EvmHeader::from_rpc(value).map_err(|e| e.context(method))?;

		let computed = header.computed_hash();
		if computed != hash {
			error!(requested = %hash, computed = %computed, "header mismatch");
			return Err(ChainError::Integrity(format!(
				"header mismatch: requested {}, node returned header hashing to {}",
				hash, computed
			)));
		}
		Ok(header)
	}

	pub async fn latest_safe_header(&self) -> Result<EvmHeader, ChainError> {
		self.header_at(BlockNumber::Safe).await
	}

	pub async fn latest_finalized_header(&self) -> Result<EvmHeader, ChainError> {
		self.header_at(BlockNumber::Finalized).await
	}

	/// Headers for the inclusive range `start..=end`, in height order.
	///
	/// A single height goes through [`Self::header_by_number`]. Restricted
	/// chains are fetched in groups of 100 heights, one task per group, each
	/// task owning a disjoint index range. Other chains use one batch.
	/// On failure the headers preceding the first failed height are returned
	/// with the error.
	pub async fn headers_by_range(&self, start: u64, end: u64, chain_id: u64) -> RangeResult<EvmHeader> {
		if start > end {
			return RangeResult::partial(
				Vec::new(),
				ChainError::InvalidInput(format!("range start {} is after end {}", start, end)),
			);
		}
		if start == end {
			return match self.header_by_number(Some(start)).await {
				Ok(header) => RangeResult::complete(vec![header]),
				Err(err) => RangeResult::partial(Vec::new(), err),
			};
		}

		let count = (end - start + 1) as usize;
		let slots = if is_restricted_batch_chain(chain_id) {
			debug!(chain_id, start, end, "fetching range in groups");
			self.range_in_groups(start, count).await
		} else {
			self.range_in_batch(start, count).await
		};

		let mut headers = Vec::with_capacity(count);
		for (offset, slot) in slots.into_iter().enumerate() {
			let height = start + offset as u64;
			match slot {
				Ok(header) => headers.push(header),
				Err(err) => {
					warn!(height, error = %err, "range fetch stopped");
					return RangeResult::partial(headers, err.context(format!("header {}", height)));
				},
			}
		}
		RangeResult::complete(headers)
	}

	async fn range_in_batch(&self, start: u64, count: usize) -> Vec<Result<EvmHeader, ChainError>> {
		let calls: Vec<BatchCall> = (0..count as u64)
			.map(|i| {
				BatchCall::new(
					"eth_getBlockByNumber",
					json!([BlockNumber::Number(start + i).to_arg(), false]),
				)
			})
			.collect();

		match self.rpc.batch(&calls).await {
			Ok(results) => results
				.into_iter()
				.enumerate()
				.map(|(i, result)| match result? {
					Some(value) => EvmHeader::from_rpc(value),
					None => Err(ChainError::NotFound(format!("header {}", start + i as u64))),
				})
				.collect(),
			Err(err) => vec![Err(err)],
		}
	}

	async fn range_in_groups(&self, start: u64, count: usize) -> Vec<Result<EvmHeader, ChainError>> {
		let mut tasks = JoinSet::new();
		for group_start in (0..count as u64).step_by(RANGE_GROUP_SIZE as usize) {
			let group_end = (group_start + RANGE_GROUP_SIZE).min(count as u64);
			let client = self.clone();
			tasks.spawn(async move {
				let mut fetched = Vec::with_capacity((group_end - group_start) as usize);
				for offset in group_start..group_end {
					let result = client.header_by_number(Some(start + offset)).await;
					fetched.push((offset as usize, result));
				}
				fetched
			});
		}

		let mut slots: Vec<Option<Result<EvmHeader, ChainError>>> = (0..count).map(|_| None).collect();
		while let Some(joined) = tasks.join_next().await {
			match joined {
				Ok(fetched) => {
					for (index, result) in fetched {
						slots[index] = Some(result);
					}
				},
				Err(e) => warn!(error = %e, "range group task failed"),
			}
		}

		slots
			.into_iter()
			.enumerate()
			.map(|(i, slot)| {
				slot.unwrap_or_else(|| {
					Err(ChainError::Transport(format!(
						"header {} was not fetched",
						start + i as u64
					)))
				})
			})
			.collect()
	}

	/// Block at `number` (latest when `None`), with full transactions when `full`.
	pub async fn block_by_number(&self, number: Option<u64>, full: bool) -> Result<RpcBlock, ChainError> {
		let tag = BlockNumber::from_height(number).to_arg();
		self.rpc
			.call_optional("eth_getBlockByNumber", json!([tag, full]))
			.await?
			.ok_or_else(|| ChainError::NotFound(format!("block {}", tag)))
	}

	pub async fn block_by_hash(&self, hash: B256, full: bool) -> Result<RpcBlock, ChainError> {
		self.rpc
			.call_optional("eth_getBlockByHash", json!([hash, full]))
			.await?
			.ok_or_else(|| ChainError::NotFound(format!("block {}", hash)))
	}

	/// Nonce of `address` at the latest block.
	pub async fn tx_count(&self, address: Address) -> Result<u64, ChainError> {
		let nonce: U64 = self
			.rpc
			.call("eth_getTransactionCount", json!([address, "latest"]))
			.await?;
		debug!(%address, nonce = %nonce, "fetched nonce");
		Ok(nonce.to::<u64>())
	}

	pub async fn suggest_gas_price(&self) -> Result<U256, ChainError> {
		self.rpc.call("eth_gasPrice", json!([])).await
	}

	pub async fn suggest_gas_tip_cap(&self) -> Result<U256, ChainError> {
		self.rpc.call("eth_maxPriorityFeePerGas", json!([])).await
	}

	/// Broadcasts a 0x-hex signed envelope and returns the node's tx hash.
	pub async fn send_raw_transaction(&self, raw_tx: &str) -> Result<B256, ChainError> {
		let raw_tx = with_0x_prefix(raw_tx.trim());
		let hash: B256 = self
			.rpc
			.call("eth_sendRawTransaction", json!([raw_tx]))
			.await?;
		info!(tx_hash = %hash, "broadcast transaction");
		Ok(hash)
	}

	pub async fn tx_by_hash(&self, hash: B256) -> Result<RpcTransaction, ChainError> {
		self.rpc
			.call_optional("eth_getTransactionByHash", json!([hash]))
			.await?
			.ok_or_else(|| ChainError::NotFound(format!("transaction {}", hash)))
	}

	pub async fn tx_receipt_by_hash(&self, hash: B256) -> Result<RpcReceipt, ChainError> {
		self.rpc
			.call_optional("eth_getTransactionReceipt", json!([hash]))
			.await?
			.ok_or_else(|| ChainError::NotFound(format!("receipt {}", hash)))
	}

	/// Storage root of `address` at `block` (latest when `None`), via `eth_getProof`.
	pub async fn storage_hash(&self, address: Address, block: Option<u64>) -> Result<B256, ChainError> {
		let tag = BlockNumber::from_height(block).to_arg();
		let proof: AccountProof = self
			.rpc
			.call("eth_getProof", json!([address, Vec::<B256>::new(), tag]))
			.await?;
		Ok(proof.storage_hash)
	}

	/// Empty bytecode means an externally-owned account.
	pub async fn code_kind(&self, address: Address) -> Result<AccountKind, ChainError> {
		let code: Bytes = self.rpc.call("eth_getCode", json!([address, "latest"])).await?;
		Ok(if code.is_empty() {
			AccountKind::Eoa
		} else {
			AccountKind::Contract
		})
	}

	pub async fn balance(&self, address: Address) -> Result<U256, ChainError> {
		self.rpc
			.call("eth_getBalance", json!([address, "latest"]))
			.await
			.map_err(|e| e.context(format!("get balance of {}", address)))
	}

	/// Logs matching `query` together with the header of its target block.
	///
	/// Restricted chains get two sequential calls instead of a two-element batch.
	pub async fn filter_logs(&self, query: &FilterQuery, chain_id: u64) -> Result<Logs, ChainError> {
		let arg = query.to_arg()?;
		let target = query.target_block().to_arg();
		let rpc = self.rpc.with_timeout(self.rpc.timeout() * FILTER_TIMEOUT_FACTOR);

		let (header, logs) = if is_restricted_batch_chain(chain_id) {
			let header = rpc
				.call_optional::<Value>("eth_getBlockByNumber", json!([target, false]))
				.await;
			let logs = rpc.call_optional::<Value>("eth_getLogs", json!([arg])).await;
			(header, logs)
		} else {
			let calls = [
				BatchCall::new("eth_getBlockByNumber", json!([target, false])),
				BatchCall::new("eth_getLogs", json!([arg])),
			];
			let mut results = rpc.batch(&calls).await?.into_iter();
			let header = results.next().unwrap_or_else(|| Err(missing_reply("eth_getBlockByNumber")));
			let logs = results.next().unwrap_or_else(|| Err(missing_reply("eth_getLogs")));
			(header, logs)
		};

		let header = header
			.and_then(|value| value.ok_or_else(|| ChainError::NotFound(format!("header {}", target))))
			.and_then(EvmHeader::from_rpc)
			.map_err(|e| e.context("unable to query the filter's to_block header"))?;
		let logs: Vec<RpcLog> = match logs.map_err(|e| e.context("unable to query logs"))? {
			Some(value) => decode_result("eth_getLogs", value)?,
			None => Vec::new(),
		};

		debug!(count = logs.len(), to_block = %truncate_id(&header.hash.to_string()), "filtered logs");
		Ok(Logs {
			logs,
			to_block_header: header,
		})
	}
}

fn missing_reply(method: &str) -> ChainError {
	ChainError::Protocol(format!("{}: missing from batch reply", method))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_consensus::Header;
	use wallet_types::ErrorKind;
	use wiremock::matchers::{body_partial_json, method};
	use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

	fn header_json(number: u64) -> Value {
		let header = Header {
			number,
			timestamp: 1_700_000_000 + number,
			gas_used: 21_000,
			..Default::default()
		};
		let mut value = serde_json::to_value(&header).unwrap();
		value["hash"] = json!(header.hash_slow());
		value
	}

	fn height_of(params: &Value) -> u64 {
		let tag = params[0].as_str().unwrap();
		u64::from_str_radix(tag.trim_start_matches("0x"), 16).unwrap()
	}

	/// Answers single and batched `eth_getBlockByNumber` requests with
	/// headers whose hashes are consistent.
	struct HeaderNode;

	impl Respond for HeaderNode {
		fn respond(&self, request: &Request) -> ResponseTemplate {
			let body: Value = serde_json::from_slice(&request.body).unwrap();
			let answer = |req: &Value| {
				json!({"jsonrpc": "2.0", "id": req["id"], "result": header_json(height_of(&req["params"]))})
			};
			match body {
				Value::Array(reqs) => {
					ResponseTemplate::new(200).set_body_json(Value::Array(reqs.iter().rev().map(answer).collect()))
				},
				single => ResponseTemplate::new(200).set_body_json(answer(&single)),
			}
		}
	}

	fn client_for(server: &MockServer) -> EvmClient {
		EvmClient::new(RpcClient::new(&server.uri(), &RpcOptions::default()).unwrap())
	}

	#[tokio::test]
	async fn test_single_height_range_uses_single_call() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(HeaderNode)
			.expect(1)
			.mount(&server)
			.await;

		let result = client_for(&server).headers_by_range(100, 100, 1).await;
		assert!(result.is_complete());
		assert_eq!(result.items.len(), 1);
		assert_eq!(result.items[0].header.number, 100);

		let requests = server.received_requests().await.unwrap();
		let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
		assert!(body.is_object(), "expected a single call, not a batch");
	}

	#[tokio::test(flavor = "multi_thread")]
	async fn test_restricted_chain_matches_batch_order() {
		let server = MockServer::start().await;
		Mock::given(method("POST")).respond_with(HeaderNode).mount(&server).await;
		let client = client_for(&server);

		let batched = client.headers_by_range(10, 14, 1).await;
		let grouped = client.headers_by_range(10, 14, 42766).await;

		assert!(batched.is_complete() && grouped.is_complete());
		let heights = |r: &RangeResult<EvmHeader>| r.items.iter().map(|h| h.header.number).collect::<Vec<_>>();
		assert_eq!(heights(&batched), vec![10, 11, 12, 13, 14]);
		assert_eq!(heights(&grouped), heights(&batched));
		assert_eq!(grouped.items, batched.items);
	}

	#[tokio::test]
	async fn test_range_returns_prefix_on_missing_header() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!([
				{"jsonrpc": "2.0", "id": 1, "result": header_json(5)},
				{"jsonrpc": "2.0", "id": 2, "result": null},
				{"jsonrpc": "2.0", "id": 3, "result": header_json(7)}
			])))
			.mount(&server)
			.await;

		let result = client_for(&server).headers_by_range(5, 7, 1).await;
		assert_eq!(result.items.len(), 1);
		assert_eq!(result.error.unwrap().kind(), ErrorKind::NotFound);
	}

	#[tokio::test]
	async fn test_header_by_hash_integrity() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(
				ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": header_json(9)})),
			)
			.mount(&server)
			.await;
		let client = client_for(&server);

		let good: B256 = serde_json::from_value(header_json(9)["hash"].clone()).unwrap();
		assert_eq!(client.header_by_hash(good).await.unwrap().header.number, 9);

		let err = client.header_by_hash(B256::repeat_byte(0xab)).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Integrity);
	}

	#[tokio::test]
	async fn test_null_header_is_not_found() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": null})))
			.mount(&server)
			.await;

		let err = client_for(&server).header_by_number(Some(1)).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::NotFound);
	}

	#[tokio::test]
	async fn test_code_kind_and_balance() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "eth_getCode"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": "0x"})))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "eth_getBalance"})))
			.respond_with(
				ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": "0xde0b6b3a7640000"})),
			)
			.mount(&server)
			.await;
		let client = client_for(&server);

		assert_eq!(client.code_kind(Address::ZERO).await.unwrap(), AccountKind::Eoa);
		assert_eq!(
			client.balance(Address::ZERO).await.unwrap(),
			U256::from(1_000_000_000_000_000_000u64)
		);
	}

	#[tokio::test]
	async fn test_filter_logs_batch_and_restricted() {
		let server = MockServer::start().await;
		let log = json!({
			"address": Address::repeat_byte(0x11),
			"topics": [B256::repeat_byte(0x22)],
			"data": "0x",
			"blockNumber": "0x3"
		});
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "eth_getLogs"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": [log.clone()]})))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({"method": "eth_getBlockByNumber"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": header_json(3)})))
			.mount(&server)
			.await;
		// Batch bodies are arrays and never match the per-method mocks above.
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!([
				{"jsonrpc": "2.0", "id": 2, "result": [log]},
				{"jsonrpc": "2.0", "id": 1, "result": header_json(3)}
			])))
			.mount(&server)
			.await;

		let query = FilterQuery {
			to_block: Some(BlockNumber::Number(3)),
			..Default::default()
		};

		let batched = client_for(&server).filter_logs(&query, 1).await.unwrap();
		assert_eq!(batched.logs.len(), 1);
		assert_eq!(batched.to_block_header.header.number, 3);

		let restricted = client_for(&server).filter_logs(&query, 43851).await.unwrap();
		assert_eq!(restricted.logs, batched.logs);
	}
}
