//! Chain adapter module for the wallet node.
//!
//! Every supported chain implements [`ChainAdapter`], one capability surface
//! covering address handling, block and account reads, fee quotes and the
//! build/attach/verify transaction pipeline. The [`AdapterService`] routes a
//! request to the adapter registered under its chain identifier.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use wallet_types::{
	AccountQuery, Block, BlockByHash, BlockByNumber, BlockHeader, ChainAccount, ChainError, ChainRequest,
	ConfigSchema, ConvertAddress, DecodeTx, ExtraData, FeeQuery, FeeQuote, HeaderByHash, HeaderByNumber,
	HeaderRange, ImplementationRegistry, RangeResult, SendTx, SignedTransaction, SignedTx, SupportChains,
	TxByAddress, TxByHash, TxMessage, UnsignedTransaction, UnsignedTx, ValidateAddress, VerifyTx,
};

pub mod explorer;

/// Re-export implementations
pub mod implementations {
	pub mod ethereum;
	pub mod solana;
}

/// Errors raised while constructing or selecting adapters.
#[derive(Debug, Error)]
pub enum AdapterError {
	/// No adapter is registered for the requested chain.
	#[error("Unsupported chain: {0}")]
	UnsupportedChain(String),
	/// An adapter table failed schema validation or could not be parsed.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
	/// Failure reported by the adapter's chain client.
	#[error(transparent)]
	Chain(#[from] ChainError),
}

/// Capability surface shared by every chain.
///
/// Each method receives the chain/network envelope and implementations
/// reject envelopes addressed elsewhere before doing any work. Operations a
/// chain does not support keep the default body and fail with
/// `NotImplemented`.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
	/// Returns the configuration schema for this adapter.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Chain identifier the adapter is registered under, e.g. `Ethereum`.
	fn chain(&self) -> &str;

	fn network(&self) -> &str;

	/// Whether this adapter serves the requested chain and network.
	async fn support_chains(&self, request: &ChainRequest<SupportChains>) -> Result<bool, ChainError> {
		Ok(request.ensure_target(self.chain(), self.network()).is_ok())
	}

	/// Derives an address from a hex public key.
	async fn convert_address(&self, _request: &ChainRequest<ConvertAddress>) -> Result<String, ChainError> {
		Err(ChainError::not_implemented("convert_address"))
	}

	async fn validate_address(&self, _request: &ChainRequest<ValidateAddress>) -> Result<bool, ChainError> {
		Err(ChainError::not_implemented("validate_address"))
	}

	async fn block_by_number(&self, _request: &ChainRequest<BlockByNumber>) -> Result<Block, ChainError> {
		Err(ChainError::not_implemented("block_by_number"))
	}

	async fn block_by_hash(&self, _request: &ChainRequest<BlockByHash>) -> Result<Block, ChainError> {
		Err(ChainError::not_implemented("block_by_hash"))
	}

	async fn header_by_number(&self, _request: &ChainRequest<HeaderByNumber>) -> Result<BlockHeader, ChainError> {
		Err(ChainError::not_implemented("header_by_number"))
	}

	async fn header_by_hash(&self, _request: &ChainRequest<HeaderByHash>) -> Result<BlockHeader, ChainError> {
		Err(ChainError::not_implemented("header_by_hash"))
	}

	/// Headers for an inclusive height range. Whatever was fetched before a
	/// failure is returned alongside the error.
	async fn header_range(
		&self,
		_request: &ChainRequest<HeaderRange>,
	) -> Result<RangeResult<BlockHeader>, ChainError> {
		Err(ChainError::not_implemented("header_range"))
	}

	async fn account(&self, _request: &ChainRequest<AccountQuery>) -> Result<ChainAccount, ChainError> {
		Err(ChainError::not_implemented("account"))
	}

	async fn fee(&self, _request: &ChainRequest<FeeQuery>) -> Result<FeeQuote, ChainError> {
		Err(ChainError::not_implemented("fee"))
	}

	/// Broadcasts a signed transaction and returns its hash.
	async fn send_tx(&self, _request: &ChainRequest<SendTx>) -> Result<String, ChainError> {
		Err(ChainError::not_implemented("send_tx"))
	}

	async fn tx_by_address(&self, _request: &ChainRequest<TxByAddress>) -> Result<Vec<TxMessage>, ChainError> {
		Err(ChainError::not_implemented("tx_by_address"))
	}

	async fn tx_by_hash(&self, _request: &ChainRequest<TxByHash>) -> Result<TxMessage, ChainError> {
		Err(ChainError::not_implemented("tx_by_hash"))
	}

	/// Signing payload for an external signer.
	async fn create_unsigned_tx(
		&self,
		_request: &ChainRequest<UnsignedTx>,
	) -> Result<UnsignedTransaction, ChainError> {
		Err(ChainError::not_implemented("create_unsigned_tx"))
	}

	/// Attaches an external signature to the resubmitted request.
	async fn build_signed_tx(&self, _request: &ChainRequest<SignedTx>) -> Result<SignedTransaction, ChainError> {
		Err(ChainError::not_implemented("build_signed_tx"))
	}

	async fn decode_tx(&self, _request: &ChainRequest<DecodeTx>) -> Result<Value, ChainError> {
		Err(ChainError::not_implemented("decode_tx"))
	}

	/// Verifies a signed transaction and returns the signer's address.
	async fn verify_signed_tx(&self, _request: &ChainRequest<VerifyTx>) -> Result<String, ChainError> {
		Err(ChainError::not_implemented("verify_signed_tx"))
	}

	/// Chain-specific queries selected by `kind`.
	async fn extra_data(&self, _request: &ChainRequest<ExtraData>) -> Result<Value, ChainError> {
		Err(ChainError::not_implemented("extra_data"))
	}
}

/// Type alias for adapter factory functions.
pub type AdapterFactory = fn(&toml::Value) -> Result<Box<dyn ChainAdapter>, AdapterError>;

/// Registry trait for adapter implementations.
pub trait AdapterRegistry: ImplementationRegistry<Factory = AdapterFactory> {}

/// Get all registered adapter implementations.
///
/// Returns `(config key, factory)` pairs.
pub fn get_all_implementations() -> Vec<(&'static str, AdapterFactory)> {
	use implementations::{ethereum, solana};

	vec![
		(ethereum::Registry::NAME, ethereum::Registry::factory()),
		(solana::Registry::NAME, solana::Registry::factory()),
	]
}

/// Adapters keyed by chain identifier.
pub struct AdapterService {
	adapters: HashMap<String, Box<dyn ChainAdapter>>,
}

impl AdapterService {
	pub fn new(adapters: Vec<Box<dyn ChainAdapter>>) -> Self {
		let adapters = adapters
			.into_iter()
			.map(|adapter| (adapter.chain().to_string(), adapter))
			.collect();
		Self { adapters }
	}

	/// Adapter serving `chain`.
	pub fn adapter(&self, chain: &str) -> Result<&dyn ChainAdapter, AdapterError> {
		debug!(chain, "resolving adapter");
		self.adapters
			.get(chain)
			.map(|adapter| adapter.as_ref())
			.ok_or_else(|| AdapterError::UnsupportedChain(chain.to_string()))
	}

	/// Registered chain identifiers, sorted.
	pub fn chains(&self) -> Vec<&str> {
		let mut chains: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
		chains.sort_unstable();
		chains
	}

	/// Support probe across every adapter.
	pub async fn support_chains(&self, chain: &str, network: &str) -> bool {
		let Ok(adapter) = self.adapter(chain) else {
			return false;
		};
		let request = ChainRequest::new(chain, network, SupportChains::default());
		adapter.support_chains(&request).await.unwrap_or(false)
	}
}
