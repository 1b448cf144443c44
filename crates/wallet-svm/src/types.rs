//! Solana JSON-RPC wire types.
//!
//! Only the fields the client and classifier read are modelled. Instruction
//! payloads are decoded into a closed set of shapes; anything else fails to
//! deserialize instead of being probed at use time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read-consistency level of a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
	Processed,
	Confirmed,
	#[default]
	Finalized,
}

/// How much transaction data `getBlock` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDetails {
	Full,
	Accounts,
	Signatures,
	None,
}

/// Node health as reported by `getHealth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
	Ok,
	Behind,
}

/// `{ context, value }` wrapper used by most account queries.
#[derive(Debug, Clone, Deserialize)]
pub struct WithContext<T> {
	pub value: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
	pub lamports: u64,
	pub owner: String,
	/// `[payload, encoding]`.
	#[serde(default)]
	pub data: Vec<String>,
	#[serde(default)]
	pub executable: bool,
	#[serde(default)]
	pub rent_epoch: u64,
	#[serde(default)]
	pub space: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestBlockhash {
	pub blockhash: String,
	#[serde(default)]
	pub last_valid_block_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizationFee {
	pub slot: u64,
	pub prioritization_fee: u64,
}

/// Mint supply, as returned by `getTokenSupply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
	pub amount: String,
	pub decimals: u8,
	#[serde(default)]
	pub ui_amount_string: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
	pub signature: String,
	pub slot: u64,
	#[serde(default)]
	pub err: Option<Value>,
	#[serde(default)]
	pub memo: Option<String>,
	#[serde(default)]
	pub block_time: Option<i64>,
	#[serde(default)]
	pub confirmation_status: Option<String>,
}

/// Pagination for `getSignaturesForAddress`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignaturesQuery {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub limit: Option<u64>,
	/// Start searching backwards from this signature, exclusive.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub before: Option<String>,
	/// Stop at this signature, inclusive.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub until: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOptions {
	pub encoding: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub preflight_commitment: Option<Commitment>,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub skip_preflight: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_retries: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub min_context_slot: Option<u64>,
}

impl Default for SendOptions {
	fn default() -> Self {
		Self {
			encoding: "base58".into(),
			preflight_commitment: Some(Commitment::Finalized),
			skip_preflight: false,
			max_retries: None,
			min_context_slot: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateOptions {
	pub encoding: String,
	pub commitment: Commitment,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub sig_verify: bool,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub replace_recent_blockhash: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub min_context_slot: Option<u64>,
}

impl Default for SimulateOptions {
	fn default() -> Self {
		Self {
			encoding: "base64".into(),
			commitment: Commitment::Finalized,
			sig_verify: false,
			replace_recent_blockhash: false,
			min_context_slot: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResult {
	#[serde(default)]
	pub err: Option<Value>,
	#[serde(default)]
	pub logs: Option<Vec<String>>,
	#[serde(default)]
	pub units_consumed: Option<u64>,
}

/// Account key as rendered by `json` (plain string) or `jsonParsed`
/// (object with flags).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountKey {
	Plain(String),
	Parsed { pubkey: String },
}

impl AccountKey {
	pub fn pubkey(&self) -> &str {
		match self {
			AccountKey::Plain(key) | AccountKey::Parsed { pubkey: key } => key,
		}
	}
}

/// `parsed` member of a `jsonParsed` instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedContent {
	Typed {
		#[serde(rename = "type")]
		kind: String,
		#[serde(default)]
		info: Value,
	},
	/// Programs such as memo render their payload as a bare string.
	Text(String),
}

/// One instruction in any of the three encodings the node emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UiInstruction {
	#[serde(rename_all = "camelCase")]
	Parsed {
		program: String,
		program_id: String,
		parsed: ParsedContent,
	},
	#[serde(rename_all = "camelCase")]
	Compiled {
		program_id_index: usize,
		#[serde(default)]
		accounts: Vec<usize>,
		#[serde(default)]
		data: String,
	},
	#[serde(rename_all = "camelCase")]
	PartiallyDecoded {
		program_id: String,
		accounts: Vec<String>,
		data: String,
	},
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnerInstructions {
	pub index: u32,
	pub instructions: Vec<UiInstruction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
	pub amount: String,
	pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
	pub account_index: usize,
	pub mint: String,
	#[serde(default)]
	pub owner: Option<String>,
	pub ui_token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
	#[serde(default)]
	pub err: Option<Value>,
	#[serde(default)]
	pub fee: u64,
	#[serde(default)]
	pub pre_balances: Vec<u64>,
	#[serde(default)]
	pub post_balances: Vec<u64>,
	#[serde(default)]
	pub inner_instructions: Option<Vec<InnerInstructions>>,
	#[serde(default)]
	pub pre_token_balances: Option<Vec<TokenBalance>>,
	#[serde(default)]
	pub post_token_balances: Option<Vec<TokenBalance>>,
	#[serde(default)]
	pub log_messages: Option<Vec<String>>,
	#[serde(default)]
	pub compute_units_consumed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiMessage {
	pub account_keys: Vec<AccountKey>,
	#[serde(default)]
	pub instructions: Vec<UiInstruction>,
	#[serde(default)]
	pub recent_blockhash: String,
}

impl UiMessage {
	/// Base58 key at `index`, if present.
	pub fn key(&self, index: usize) -> Option<&str> {
		self.account_keys.get(index).map(AccountKey::pubkey)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiTransaction {
	pub message: UiMessage,
	#[serde(default)]
	pub signatures: Vec<String>,
}

/// Result of `getTransaction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
	pub slot: u64,
	#[serde(default)]
	pub block_time: Option<i64>,
	#[serde(default)]
	pub version: Option<Value>,
	pub transaction: UiTransaction,
	#[serde(default)]
	pub meta: Option<TransactionMeta>,
}

impl TransactionResult {
	pub fn signature(&self) -> Option<&str> {
		self.transaction.signatures.first().map(String::as_str)
	}
}

/// Transaction entry inside a `full` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTransactionEntry {
	pub transaction: UiTransaction,
	#[serde(default)]
	pub meta: Option<TransactionMeta>,
	#[serde(default)]
	pub version: Option<Value>,
}

/// Result of `getBlock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResult {
	pub blockhash: String,
	#[serde(default)]
	pub previous_blockhash: String,
	#[serde(default)]
	pub parent_slot: u64,
	#[serde(default)]
	pub block_time: Option<i64>,
	#[serde(default)]
	pub block_height: Option<u64>,
	#[serde(default)]
	pub signatures: Vec<String>,
	#[serde(default)]
	pub transactions: Vec<BlockTransactionEntry>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_instruction_shapes() {
		let parsed: UiInstruction = serde_json::from_value(json!({
			"program": "spl-token",
			"programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
			"parsed": {"type": "transfer", "info": {"amount": "5"}},
			"stackHeight": 2
		}))
		.unwrap();
		assert!(matches!(parsed, UiInstruction::Parsed { ref program, .. } if program == "spl-token"));

		let compiled: UiInstruction =
			serde_json::from_value(json!({"programIdIndex": 3, "accounts": [0, 1], "data": "3Bxs4h24hBtQy9rw"}))
				.unwrap();
		assert!(matches!(compiled, UiInstruction::Compiled { program_id_index: 3, .. }));

		let partial: UiInstruction = serde_json::from_value(json!({
			"programId": "BGumetW1zi6dfL4nqJG1oD8T4PZ9FeZr4u8B7u4N1NYy",
			"accounts": ["a", "b"],
			"data": "xyz"
		}))
		.unwrap();
		assert!(matches!(partial, UiInstruction::PartiallyDecoded { .. }));

		let memo: UiInstruction = serde_json::from_value(json!({
			"program": "spl-memo",
			"programId": "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr",
			"parsed": "hello"
		}))
		.unwrap();
		assert!(matches!(memo, UiInstruction::Parsed { parsed: ParsedContent::Text(_), .. }));
	}

	#[test]
	fn test_unknown_instruction_shape_fails() {
		let result = serde_json::from_value::<UiInstruction>(json!({"stackHeight": 1, "weird": true}));
		assert!(result.is_err());
	}

	#[test]
	fn test_account_key_encodings() {
		let keys: Vec<AccountKey> = serde_json::from_value(json!([
			"11111111111111111111111111111111",
			{"pubkey": "Vote111111111111111111111111111111111111111", "signer": false, "writable": false}
		]))
		.unwrap();
		assert_eq!(keys[0].pubkey(), "11111111111111111111111111111111");
		assert_eq!(keys[1].pubkey(), "Vote111111111111111111111111111111111111111");
	}
}
