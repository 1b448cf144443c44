//! Block-explorer history collaborator.
//!
//! Transaction history by address is served by third-party explorers rather
//! than the node. Many explorers mimic the Etherscan `module=account` API, so
//! one client covers them; only the action names differ per chain.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use wallet_types::{ChainError, TransferKind, TxMessage, TxStatus};

const EXPLORER_TIMEOUT: Duration = Duration::from_secs(30);

/// Paginated history query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
	pub address: String,
	pub contract_address: Option<String>,
	pub page: u32,
	pub page_size: u32,
}

#[async_trait]
pub trait ExplorerInterface: Send + Sync {
	async fn transactions_by_address(&self, query: &HistoryQuery) -> Result<Vec<TxMessage>, ChainError>;
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
	status: String,
	#[serde(default)]
	message: String,
	#[serde(default)]
	result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplorerTx {
	hash: String,
	#[serde(default)]
	from: String,
	#[serde(default)]
	to: String,
	#[serde(default)]
	value: String,
	#[serde(default)]
	block_number: String,
	#[serde(default)]
	gas_used: String,
	#[serde(default)]
	gas_price: String,
	#[serde(default)]
	is_error: String,
	#[serde(default)]
	contract_address: String,
}

impl ExplorerTx {
	fn into_message(self, token: bool) -> TxMessage {
		let fee = match (self.gas_used.parse::<u128>(), self.gas_price.parse::<u128>()) {
			(Ok(used), Ok(price)) => used.saturating_mul(price).to_string(),
			_ => "0".into(),
		};
		let contract = (!self.contract_address.is_empty()).then_some(self.contract_address);
		TxMessage {
			hash: self.hash,
			from: self.from,
			to: self.to,
			amount: if self.value.is_empty() { "0".into() } else { self.value },
			fee,
			status: if self.is_error == "1" {
				TxStatus::Failed
			} else {
				TxStatus::Success
			},
			kind: if token {
				TransferKind::FungibleToken
			} else {
				TransferKind::Native
			},
			contract_address: contract,
			height: self.block_number.parse().unwrap_or_default(),
		}
	}
}

/// Etherscan-compatible `account` API client.
#[derive(Debug, Clone)]
pub struct EtherscanClient {
	http: reqwest::Client,
	base_url: String,
	api_key: Option<String>,
	native_action: &'static str,
	token_action: &'static str,
}

impl EtherscanClient {
	pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, ChainError> {
		let http = reqwest::Client::builder()
			.timeout(EXPLORER_TIMEOUT)
			.build()
			.map_err(|e| ChainError::Transport(format!("failed to build HTTP client: {}", e)))?;
		Ok(Self {
			http,
			base_url: base_url.into(),
			api_key: api_key.filter(|key| !key.is_empty()),
			native_action: "txlist",
			token_action: "tokentx",
		})
	}

	/// Overrides the action names used for native and token history.
	pub fn with_actions(mut self, native: &'static str, token: &'static str) -> Self {
		self.native_action = native;
		self.token_action = token;
		self
	}
}

#[async_trait]
impl ExplorerInterface for EtherscanClient {
	async fn transactions_by_address(&self, query: &HistoryQuery) -> Result<Vec<TxMessage>, ChainError> {
		let token = query.contract_address.as_deref().is_some_and(|c| !c.is_empty());
		let action = if token { self.token_action } else { self.native_action };

		let mut params = vec![
			("module", "account".to_string()),
			("action", action.to_string()),
			("address", query.address.clone()),
			("page", query.page.max(1).to_string()),
			("offset", query.page_size.max(1).to_string()),
			("sort", "desc".to_string()),
		];
		if let Some(contract) = query.contract_address.as_ref().filter(|_| token) {
			params.push(("contractaddress", contract.clone()));
		}
		if let Some(key) = &self.api_key {
			params.push(("apikey", key.clone()));
		}
		debug!(action, address = %query.address, page = query.page, "explorer history query");

		let response = self
			.http
			.get(&self.base_url)
			.query(&params)
			.send()
			.await
			.map_err(|e| ChainError::Transport(format!("explorer request failed: {}", e)))?
			.error_for_status()
			.map_err(|e| ChainError::Transport(format!("explorer returned error status: {}", e)))?;
		let body: ExplorerResponse = response
			.json()
			.await
			.map_err(|e| ChainError::Protocol(format!("invalid explorer response: {}", e)))?;

		if body.status != "1" {
			if body.message.starts_with("No transactions found") {
				return Ok(Vec::new());
			}
			warn!(message = %body.message, "explorer rejected history query");
			return Err(ChainError::Protocol(format!(
				"explorer error: {} {}",
				body.message, body.result
			)));
		}
		let txs: Vec<ExplorerTx> = serde_json::from_value(body.result)
			.map_err(|e| ChainError::Protocol(format!("invalid explorer transaction list: {}", e)))?;
		Ok(txs.into_iter().map(|tx| tx.into_message(token)).collect())
	}
}
