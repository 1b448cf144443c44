//! Error taxonomy for chain operations.
//!
//! Every failure surfaced by a chain client or adapter falls into exactly one
//! [`ErrorKind`]. Callers branch on the kind; the variant carries the detail.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// Rejected before any network call.
	InvalidInput,
	/// The node answered an existence query with an empty result.
	NotFound,
	/// Connection failure, timeout or cancellation.
	Transport,
	/// RPC error object or structurally invalid payload.
	Protocol,
	/// Returned data failed a cross-check.
	Integrity,
	/// Operation intentionally unsupported for this chain.
	NotImplemented,
}

/// Errors produced by chain clients, codecs and adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
	/// Malformed address, signature, amount, or chain/network mismatch.
	#[error("Invalid input: {0}")]
	InvalidInput(String),
	/// The node returned null or an explicit not-found code.
	#[error("Not found: {0}")]
	NotFound(String),
	/// Connection or HTTP-level failure.
	#[error("Transport error: {0}")]
	Transport(String),
	/// A call exceeded its deadline or was cancelled.
	#[error("Timed out: {0}")]
	Timeout(String),
	/// Well-formed JSON-RPC error object returned by the node.
	#[error("RPC error {code}: {message}")]
	Rpc { code: i64, message: String },
	/// Payload could not be decoded or was semantically empty.
	#[error("Protocol error: {0}")]
	Protocol(String),
	/// Cross-check failure such as a header hash or sender mismatch.
	#[error("Integrity error: {0}")]
	Integrity(String),
	/// Unsupported chain/operation combination.
	#[error("Not implemented: {0}")]
	NotImplemented(String),
}

impl ChainError {
	/// Category of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			ChainError::InvalidInput(_) => ErrorKind::InvalidInput,
			ChainError::NotFound(_) => ErrorKind::NotFound,
			ChainError::Transport(_) | ChainError::Timeout(_) => ErrorKind::Transport,
			ChainError::Rpc { .. } | ChainError::Protocol(_) => ErrorKind::Protocol,
			ChainError::Integrity(_) => ErrorKind::Integrity,
			ChainError::NotImplemented(_) => ErrorKind::NotImplemented,
		}
	}

	/// Prefixes the message with the operation that produced it.
	///
	/// RPC error objects keep their code and only gain a message prefix.
	pub fn context(self, operation: impl std::fmt::Display) -> Self {
		let wrap = |msg: String| format!("{}: {}", operation, msg);
		match self {
			ChainError::InvalidInput(m) => ChainError::InvalidInput(wrap(m)),
			ChainError::NotFound(m) => ChainError::NotFound(wrap(m)),
			ChainError::Transport(m) => ChainError::Transport(wrap(m)),
			ChainError::Timeout(m) => ChainError::Timeout(wrap(m)),
			ChainError::Rpc { code, message } => ChainError::Rpc {
				code,
				message: wrap(message),
			},
			ChainError::Protocol(m) => ChainError::Protocol(wrap(m)),
			ChainError::Integrity(m) => ChainError::Integrity(wrap(m)),
			ChainError::NotImplemented(m) => ChainError::NotImplemented(wrap(m)),
		}
	}

	/// Shorthand for an unsupported operation.
	pub fn not_implemented(operation: &str) -> Self {
		ChainError::NotImplemented(operation.to_string())
	}
}

/// Outcome of a multi-step range operation.
///
/// `items` holds everything accumulated before `error` stopped the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeResult<T> {
	pub items: Vec<T>,
	pub error: Option<ChainError>,
}

impl<T> RangeResult<T> {
	pub fn complete(items: Vec<T>) -> Self {
		Self { items, error: None }
	}

	pub fn partial(items: Vec<T>, error: ChainError) -> Self {
		Self {
			items,
			error: Some(error),
		}
	}

	/// True when the run finished without stopping early.
	pub fn is_complete(&self) -> bool {
		self.error.is_none()
	}

	/// Drops partial items and returns the stopping error, if any.
	pub fn into_result(self) -> Result<Vec<T>, ChainError> {
		match self.error {
			Some(err) => Err(err),
			None => Ok(self.items),
		}
	}
}
