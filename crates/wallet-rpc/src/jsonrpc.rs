//! JSON-RPC 2.0 wire types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wallet_types::ChainError;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Serialize)]
pub(crate) struct Request<'a> {
	pub jsonrpc: &'static str,
	pub id: u64,
	pub method: &'a str,
	pub params: &'a Value,
}

impl<'a> Request<'a> {
	pub fn new(id: u64, method: &'a str, params: &'a Value) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION,
			id,
			method,
			params,
		}
	}
}

/// Error object carried in a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

impl From<ErrorObject> for ChainError {
	fn from(err: ErrorObject) -> Self {
		ChainError::Rpc {
			code: err.code,
			message: err.message,
		}
	}
}

/// Response envelope. A `null` result and an absent result are both `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
	#[serde(default)]
	pub id: Value,
	#[serde(default)]
	pub result: Option<Value>,
	#[serde(default)]
	pub error: Option<ErrorObject>,
}

impl Response {
	pub fn id_u64(&self) -> Option<u64> {
		self.id.as_u64()
	}

	/// Error object wins over any result.
	pub fn into_result(self) -> Result<Option<Value>, ChainError> {
		match self.error {
			Some(err) => Err(err.into()),
			None => Ok(self.result),
		}
	}
}

/// Reply to a batch request. Some nodes answer a rejected batch with a
/// single envelope instead of an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum BatchReply {
	Many(Vec<Response>),
	One(Response),
}

/// Converts a raw result into the caller's type.
pub fn decode_result<R: DeserializeOwned>(method: &str, value: Value) -> Result<R, ChainError> {
	serde_json::from_value(value)
		.map_err(|e| ChainError::Protocol(format!("{}: unexpected result shape: {}", method, e)))
}
