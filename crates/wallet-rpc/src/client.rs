//! HTTP JSON-RPC client with per-call deadlines and retried dialing.

use crate::jsonrpc::{decode_result, BatchReply, Request, Response};
use backoff::ExponentialBackoffBuilder;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use wallet_types::ChainError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const ERROR_BODY_LIMIT: usize = 256;

/// Timeouts and dial policy.
#[derive(Debug, Clone)]
pub struct RpcOptions {
	/// Deadline applied to every call unless overridden with [`RpcClient::with_timeout`].
	pub request_timeout: Duration,
	/// Budget for the whole dial sequence, all attempts included.
	pub dial_timeout: Duration,
	pub dial_attempts: u32,
}

impl Default for RpcOptions {
	fn default() -> Self {
		Self {
			request_timeout: Duration::from_secs(10),
			dial_timeout: Duration::from_secs(5),
			dial_attempts: 5,
		}
	}
}

/// One element of a batch request.
#[derive(Debug, Clone)]
pub struct BatchCall {
	pub method: String,
	pub params: Value,
}

impl BatchCall {
	pub fn new(method: impl Into<String>, params: Value) -> Self {
		Self {
			method: method.into(),
			params,
		}
	}
}

/// Stateless JSON-RPC client, cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct RpcClient {
	http: reqwest::Client,
	url: Url,
	timeout: Duration,
	next_id: Arc<AtomicU64>,
}

impl RpcClient {
	/// Builds a client without contacting the endpoint.
	pub fn new(url: &str, options: &RpcOptions) -> Result<Self, ChainError> {
		let url = Url::parse(url)
			.map_err(|e| ChainError::InvalidInput(format!("invalid RPC url '{}': {}", url, e)))?;
		let http = reqwest::Client::builder()
			.build()
			.map_err(|e| ChainError::Transport(format!("failed to build HTTP client: {}", e)))?;
		Ok(Self {
			http,
			url,
			timeout: options.request_timeout,
			next_id: Arc::new(AtomicU64::new(1)),
		})
	}

	/// Dials the endpoint, retrying with exponential backoff.
	///
	/// Each attempt first checks that the host accepts TCP connections, then
	/// issues `handshake` (any well-formed JSON-RPC reply counts as alive).
	/// Gives up after `dial_attempts` tries or once `dial_timeout` elapses.
	pub async fn connect(url: &str, options: &RpcOptions, handshake: &str) -> Result<Self, ChainError> {
		let client = Self::new(url, options)?;
		let policy = ExponentialBackoffBuilder::new()
			.with_initial_interval(Duration::from_millis(100))
			.with_max_elapsed_time(Some(options.dial_timeout))
			.build();

		let attempts = AtomicU32::new(0);
		let max_attempts = options.dial_attempts.max(1);
		let (client_ref, attempts_ref) = (&client, &attempts);
		let dial = backoff::future::retry(policy, move || async move {
			let attempt = attempts_ref.fetch_add(1, Ordering::SeqCst) + 1;
			match client_ref.dial_once(handshake).await {
				Ok(()) => Ok(()),
				Err(err) if attempt >= max_attempts => Err(backoff::Error::permanent(err)),
				Err(err) => {
					warn!(url = %client_ref.url, attempt, error = %err, "dial attempt failed");
					Err(backoff::Error::transient(err))
				},
			}
		});

		tokio::time::timeout(options.dial_timeout, dial)
			.await
			.map_err(|_| {
				ChainError::Timeout(format!(
					"dial {} exceeded {:?}",
					client.url, options.dial_timeout
				))
			})?
			.map_err(|e| e.context(format!("dial {}", client.url)))?;

		info!(url = %client.url, attempts = attempts.load(Ordering::SeqCst), "connected to RPC endpoint");
		Ok(client)
	}

	pub fn url(&self) -> &Url {
		&self.url
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Copy of this client sharing the connection pool but using another deadline.
	pub fn with_timeout(&self, timeout: Duration) -> Self {
		Self {
			timeout,
			..self.clone()
		}
	}

	async fn dial_once(&self, handshake: &str) -> Result<(), ChainError> {
		self.probe().await?;
		self.call_envelope(handshake, Value::Array(vec![])).await.map(|_| ())
	}

	/// Checks that the endpoint's host:port accepts TCP connections.
	async fn probe(&self) -> Result<(), ChainError> {
		let host = self
			.url
			.host_str()
			.ok_or_else(|| ChainError::InvalidInput(format!("RPC url has no host: {}", self.url)))?;
		let port = self
			.url
			.port_or_known_default()
			.ok_or_else(|| ChainError::InvalidInput(format!("RPC url has no port: {}", self.url)))?;

		match tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await {
			Ok(Ok(_)) => Ok(()),
			Ok(Err(e)) => Err(ChainError::Transport(format!(
				"address unavailable ({}:{}): {}",
				host, port, e
			))),
			Err(_) => Err(ChainError::Timeout(format!("probe {}:{}", host, port))),
		}
	}

	fn next_id(&self) -> u64 {
		self.next_id.fetch_add(1, Ordering::Relaxed)
	}

	/// Posts `body` and decodes the reply.
	///
	/// Failures are checked in order: request error, non-2xx status, then
	/// undecodable body. The whole exchange runs under the client deadline.
	async fn post<B, R>(&self, label: &str, body: &B) -> Result<R, ChainError>
	where
		B: serde::Serialize + ?Sized,
		R: DeserializeOwned,
	{
		let exchange = async {
			let response = self
				.http
				.post(self.url.clone())
				.json(body)
				.send()
				.await
				.map_err(|e| ChainError::Transport(format!("{}: request failed: {}", label, e)))?;

			let status = response.status();
			if !status.is_success() {
				let mut text = response.text().await.unwrap_or_default();
				text.truncate(ERROR_BODY_LIMIT);
				return Err(ChainError::Transport(format!(
					"{}: HTTP {}: {}",
					label, status, text
				)));
			}

			response
				.json::<R>()
				.await
				.map_err(|e| ChainError::Protocol(format!("{}: invalid response body: {}", label, e)))
		};

		tokio::time::timeout(self.timeout, exchange)
			.await
			.map_err(|_| ChainError::Timeout(format!("{} exceeded {:?}", label, self.timeout)))?
	}

	/// Raw response envelope, for callers that interpret error codes themselves.
	pub async fn call_envelope(&self, method: &str, params: Value) -> Result<Response, ChainError> {
		let id = self.next_id();
		debug!(method, id, "rpc call");
		self.post(method, &Request::new(id, method, &params)).await
	}

	/// Result of `method`, or `None` when the node answers `null`.
	pub async fn call_optional<R: DeserializeOwned>(
		&self,
		method: &str,
		params: Value,
	) -> Result<Option<R>, ChainError> {
		let envelope = self.call_envelope(method, params).await?;
		match envelope.into_result().map_err(|e| e.context(method))? {
			Some(value) => decode_result(method, value).map(Some),
			None => Ok(None),
		}
	}

	/// Result of `method`; a `null` result is [`ChainError::NotFound`].
	pub async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, ChainError> {
		self.call_optional(method, params)
			.await?
			.ok_or_else(|| ChainError::NotFound(format!("{} returned null", method)))
	}

	/// Sends every call in one HTTP request.
	///
	/// The outer error covers the exchange as a whole. Per-element outcomes
	/// are returned in request order, matched by id rather than reply order.
	pub async fn batch(
		&self,
		calls: &[BatchCall],
	) -> Result<Vec<Result<Option<Value>, ChainError>>, ChainError> {
		if calls.is_empty() {
			return Ok(Vec::new());
		}

		let first_id = self.next_id.fetch_add(calls.len() as u64, Ordering::Relaxed);
		let requests: Vec<Request<'_>> = calls
			.iter()
			.enumerate()
			.map(|(i, call)| Request::new(first_id + i as u64, &call.method, &call.params))
			.collect();
		let label = format!("batch[{}x {}]", calls.len(), calls[0].method);
		debug!(size = calls.len(), first_id, "rpc batch");

		let replies = match self.post::<_, BatchReply>(&label, &requests).await? {
			BatchReply::Many(replies) => replies,
			BatchReply::One(reply) => {
				return match reply.error {
					Some(err) => Err(ChainError::from(err).context(&label)),
					None => Err(ChainError::Protocol(format!(
						"{}: expected an array of responses",
						label
					))),
				}
			},
		};

		let mut slots: Vec<Option<Response>> = vec![None; calls.len()];
		for reply in replies {
			let index = reply
				.id_u64()
				.and_then(|id| id.checked_sub(first_id))
				.and_then(|offset| usize::try_from(offset).ok())
				.filter(|index| *index < calls.len());
			match index {
				Some(index) => slots[index] = Some(reply),
				None => warn!(id = %reply.id, "dropping batch reply with unknown id"),
			}
		}

		Ok(slots
			.into_iter()
			.zip(calls)
			.map(|(slot, call)| match slot {
				Some(reply) => reply.into_result().map_err(|e| e.context(&call.method)),
				None => Err(ChainError::Protocol(format!(
					"{}: missing from batch reply",
					call.method
				))),
			})
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use wallet_types::ErrorKind;
	use wiremock::matchers::{body_partial_json, method};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn client_for(server: &MockServer) -> RpcClient {
		RpcClient::new(&server.uri(), &RpcOptions::default()).unwrap()
	}

	async fn mount_result(server: &MockServer, rpc_method: &str, result: Value) {
		Mock::given(method("POST"))
			.and(body_partial_json(json!({ "method": rpc_method })))
			.respond_with(
				ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result})),
			)
			.mount(server)
			.await;
	}

	#[tokio::test]
	async fn test_call_decodes_result() {
		let server = MockServer::start().await;
		mount_result(&server, "eth_gasPrice", json!("0x3b9aca00")).await;

		let price: String = client_for(&server).call("eth_gasPrice", json!([])).await.unwrap();
		assert_eq!(price, "0x3b9aca00");
	}

	#[tokio::test]
	async fn test_null_result_is_none_or_not_found() {
		let server = MockServer::start().await;
		mount_result(&server, "eth_getBlockByHash", Value::Null).await;
		let client = client_for(&server);

		let maybe: Option<Value> = client
			.call_optional("eth_getBlockByHash", json!(["0x01", false]))
			.await
			.unwrap();
		assert!(maybe.is_none());

		let err = client
			.call::<Value>("eth_getBlockByHash", json!(["0x01", false]))
			.await
			.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::NotFound);
	}

	#[tokio::test]
	async fn test_rpc_error_object_keeps_code() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0", "id": 1,
				"error": {"code": -32005, "message": "Node is behind by 42 slots"}
			})))
			.mount(&server)
			.await;

		let err = client_for(&server)
			.call::<String>("getHealth", json!([]))
			.await
			.unwrap_err();
		match err {
			ChainError::Rpc { code, message } => {
				assert_eq!(code, -32005);
				assert!(message.starts_with("getHealth: "));
			},
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_http_error_and_bad_body() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({ "method": "broken" })))
			.respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({ "method": "garbled" })))
			.respond_with(ResponseTemplate::new(200).set_body_string("not json"))
			.mount(&server)
			.await;
		let client = client_for(&server);

		let http = client.call::<Value>("broken", json!([])).await.unwrap_err();
		assert_eq!(http.kind(), ErrorKind::Transport);
		assert!(http.to_string().contains("503"));

		let body = client.call::<Value>("garbled", json!([])).await.unwrap_err();
		assert_eq!(body.kind(), ErrorKind::Protocol);
	}

	#[tokio::test]
	async fn test_call_deadline() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": "0x1"}))
					.set_delay(Duration::from_millis(500)),
			)
			.mount(&server)
			.await;

		let client = client_for(&server).with_timeout(Duration::from_millis(50));
		let err = client.call::<String>("eth_chainId", json!([])).await.unwrap_err();
		assert!(matches!(err, ChainError::Timeout(_)));
	}

	#[tokio::test]
	async fn test_batch_reordered_by_id() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!([
				{"jsonrpc": "2.0", "id": 3, "error": {"code": -32000, "message": "pruned"}},
				{"jsonrpc": "2.0", "id": 2, "result": "second"},
				{"jsonrpc": "2.0", "id": 1, "result": "first"}
			])))
			.mount(&server)
			.await;

		let calls = vec![
			BatchCall::new("eth_getBlockByNumber", json!(["0x1", false])),
			BatchCall::new("eth_getBlockByNumber", json!(["0x2", false])),
			BatchCall::new("eth_getBlockByNumber", json!(["0x3", false])),
			BatchCall::new("eth_getBlockByNumber", json!(["0x4", false])),
		];
		let results = client_for(&server).batch(&calls).await.unwrap();

		assert_eq!(results.len(), 4);
		assert_eq!(results[0].as_ref().unwrap(), &Some(json!("first")));
		assert_eq!(results[1].as_ref().unwrap(), &Some(json!("second")));
		assert!(matches!(results[2], Err(ChainError::Rpc { code: -32000, .. })));
		assert_eq!(results[3].as_ref().unwrap_err().kind(), ErrorKind::Protocol);
	}

	#[tokio::test]
	async fn test_batch_rejected_as_single_envelope() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0", "id": null,
				"error": {"code": -32600, "message": "batch too large"}
			})))
			.mount(&server)
			.await;

		let calls = vec![BatchCall::new("eth_getLogs", json!([{}]))];
		let err = client_for(&server).batch(&calls).await.unwrap_err();
		assert!(matches!(err, ChainError::Rpc { code: -32600, .. }));
	}

	#[tokio::test]
	async fn test_empty_batch_sends_nothing() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200))
			.expect(0)
			.mount(&server)
			.await;

		assert!(client_for(&server).batch(&[]).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_connect_handshake() {
		let server = MockServer::start().await;
		mount_result(&server, "eth_chainId", json!("0x1")).await;

		let client = RpcClient::connect(&server.uri(), &RpcOptions::default(), "eth_chainId")
			.await
			.unwrap();
		assert_eq!(client.url().as_str().trim_end_matches('/'), server.uri());
	}

	#[tokio::test]
	async fn test_connect_gives_up_on_closed_port() {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let port = listener.local_addr().unwrap().port();
		drop(listener);

		let options = RpcOptions {
			request_timeout: Duration::from_millis(200),
			dial_timeout: Duration::from_secs(3),
			dial_attempts: 2,
		};
		let err = RpcClient::connect(&format!("http://127.0.0.1:{port}"), &options, "eth_chainId")
			.await
			.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Transport);
	}

	#[test]
	fn test_invalid_url_rejected() {
		let err = RpcClient::new("not a url", &RpcOptions::default()).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvalidInput);
	}
}
