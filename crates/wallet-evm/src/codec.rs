//! EIP-1559 transaction construction, signature attachment and decoding.
//!
//! Requests arrive as base64-encoded JSON [`Eip1559DynamicFeeTx`]. The same
//! request is submitted twice: once to obtain the signing hash and once more,
//! with the external signature, to assemble the broadcastable envelope.

use alloy_consensus::{SignableTransaction, Transaction, TxEip1559, TxEnvelope};
use alloy_eips::eip2718::{Decodable2718, Encodable2718};
use alloy_primitives::{keccak256, Address, Bytes, PrimitiveSignature, TxKind, U256};
use alloy_sol_types::{sol, SolCall};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{error, warn};
use wallet_types::{
	with_0x_prefix, without_0x_prefix, ChainError, SignedTransaction, TransferKind, UnsignedTransaction,
};

sol! {
	function transfer(address to, uint256 amount) returns (bool);
}

/// Selector of `transfer(address,uint256)`.
pub const ERC20_TRANSFER_SELECTOR: [u8; 4] = transferCall::SELECTOR;

/// Logical EIP-1559 transfer request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip1559DynamicFeeTx {
	/// Decimal chain id.
	pub chain_id: String,
	pub nonce: u64,
	pub from_address: String,
	pub to_address: String,
	pub gas_limit: u64,
	/// Wei, decimal or 0x-hex.
	pub max_fee_per_gas: String,
	pub max_priority_fee_per_gas: String,
	/// Wei for native transfers, token base units for ERC-20.
	pub amount: String,
	/// Token contract. Empty, `0x00` or the zero address selects a native transfer.
	#[serde(default)]
	pub contract_address: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub signature: String,
}

impl Eip1559DynamicFeeTx {
	pub fn from_base64(encoded: &str) -> Result<Self, ChainError> {
		let bytes = STANDARD
			.decode(encoded.trim())
			.map_err(|e| ChainError::InvalidInput(format!("request is not base64: {}", e)))?;
		serde_json::from_slice(&bytes)
			.map_err(|e| ChainError::InvalidInput(format!("invalid transfer request: {}", e)))
	}

	pub fn to_base64(&self) -> Result<String, ChainError> {
		let json = serde_json::to_vec(self)
			.map_err(|e| ChainError::Protocol(format!("failed to encode request: {}", e)))?;
		Ok(STANDARD.encode(json))
	}

	pub fn is_native(&self) -> bool {
		is_native_contract(&self.contract_address)
	}

	pub fn from(&self) -> Result<Address, ChainError> {
		parse_address("from_address", &self.from_address)
	}
}

pub fn is_native_contract(contract: &str) -> bool {
	let contract = contract.trim();
	contract.is_empty()
		|| contract == "0x00"
		|| Address::from_str(contract).is_ok_and(|a| a == Address::ZERO)
}

fn parse_address(field: &str, value: &str) -> Result<Address, ChainError> {
	Address::from_str(value.trim())
		.map_err(|e| ChainError::InvalidInput(format!("invalid {} '{}': {}", field, value, e)))
}

fn parse_u256(field: &str, value: &str) -> Result<U256, ChainError> {
	U256::from_str(value.trim())
		.map_err(|e| ChainError::InvalidInput(format!("invalid {} '{}': {}", field, value, e)))
}

fn parse_u128(field: &str, value: &str) -> Result<u128, ChainError> {
	let wide = parse_u256(field, value)?;
	u128::try_from(wide)
		.map_err(|_| ChainError::InvalidInput(format!("{} out of range: {}", field, value)))
}

/// ABI-encoded `transfer(to, amount)` call data.
pub fn erc20_transfer_data(to: Address, amount: U256) -> Bytes {
	transferCall { to, amount }.abi_encode().into()
}

/// Destination and amount of an ERC-20 `transfer` call, when `input` is one.
pub fn decode_erc20_transfer(input: &[u8]) -> Option<(Address, U256)> {
	if input.len() < 4 + 64 || input[..4] != ERC20_TRANSFER_SELECTOR {
		return None;
	}
	transferCall::abi_decode(input, false)
		.ok()
		.map(|call| (call.to, call.amount))
}

/// Builds the unsigned transaction. Token transfers are redirected to the
/// contract with zero value and `transfer` call data.
pub fn build_transaction(request: &Eip1559DynamicFeeTx) -> Result<TxEip1559, ChainError> {
	let chain_id = request
		.chain_id
		.trim()
		.parse::<u64>()
		.map_err(|e| ChainError::InvalidInput(format!("invalid chain_id '{}': {}", request.chain_id, e)))?;
	let to = parse_address("to_address", &request.to_address)?;
	let amount = parse_u256("amount", &request.amount)?;

	let (target, value, input) = if request.is_native() {
		(to, amount, Bytes::new())
	} else {
		let contract = parse_address("contract_address", &request.contract_address)?;
		(contract, U256::ZERO, erc20_transfer_data(to, amount))
	};

	Ok(TxEip1559 {
		chain_id,
		nonce: request.nonce,
		gas_limit: request.gas_limit,
		max_fee_per_gas: parse_u128("max_fee_per_gas", &request.max_fee_per_gas)?,
		max_priority_fee_per_gas: parse_u128("max_priority_fee_per_gas", &request.max_priority_fee_per_gas)?,
		to: TxKind::Call(target),
		value,
		access_list: Default::default(),
		input,
	})
}

/// Signing hash for the external signer, plus the request to resubmit.
pub fn build_unsigned(request: &Eip1559DynamicFeeTx) -> Result<UnsignedTransaction, ChainError> {
	request.from()?;
	let tx = build_transaction(request)?;
	Ok(UnsignedTransaction {
		payload: tx.signature_hash().to_string(),
		inputs: request.to_base64()?,
	})
}

fn parse_signature(signature: &str) -> Result<PrimitiveSignature, ChainError> {
	let bytes = hex::decode(without_0x_prefix(signature.trim()))
		.map_err(|e| ChainError::InvalidInput(format!("signature is not hex: {}", e)))?;
	if bytes.len() != 65 {
		return Err(ChainError::InvalidInput(format!(
			"signature must be 65 bytes, got {}",
			bytes.len()
		)));
	}
	PrimitiveSignature::from_raw(&bytes)
		.map_err(|e| ChainError::InvalidInput(format!("malformed signature: {}", e)))
}

/// Attaches `signature` and checks that it recovers to the declared sender.
pub fn attach_signature(request: &Eip1559DynamicFeeTx, signature: &str) -> Result<SignedTransaction, ChainError> {
	let declared = request.from()?;
	let signature = parse_signature(signature)?;
	let signed = build_transaction(request)?.into_signed(signature);

	let recovered = signed
		.recover_signer()
		.map_err(|e| ChainError::Integrity(format!("signature recovery failed: {}", e)))?;
	if recovered != declared {
		error!(%declared, %recovered, "recovered sender does not match declared sender");
		return Err(ChainError::Integrity(format!(
			"sender mismatch: declared {}, signature recovers {}",
			declared, recovered
		)));
	}

	let envelope = TxEnvelope::from(signed);
	Ok(SignedTransaction {
		raw_tx: with_0x_prefix(&hex::encode(envelope.encoded_2718())),
		tx_hash: envelope.tx_hash().to_string(),
	})
}

/// Normalized view of a raw signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedTransaction {
	pub hash: String,
	pub chain_id: Option<u64>,
	pub nonce: u64,
	pub from: String,
	/// Recipient of the value; the token recipient for ERC-20 transfers.
	pub to: String,
	/// Wei, or token base units for ERC-20 transfers.
	pub amount: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub contract_address: Option<String>,
	pub gas_limit: u64,
	pub max_fee_per_gas: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_priority_fee_per_gas: Option<String>,
	pub kind: TransferKind,
}

fn decode_envelope(raw_tx: &str) -> Result<TxEnvelope, ChainError> {
	let bytes = hex::decode(without_0x_prefix(raw_tx.trim()))
		.map_err(|e| ChainError::InvalidInput(format!("raw transaction is not hex: {}", e)))?;
	TxEnvelope::decode_2718(&mut bytes.as_slice())
		.map_err(|e| ChainError::InvalidInput(format!("undecodable transaction: {}", e)))
}

/// Decodes a 0x-hex EIP-2718 envelope and recovers its sender.
///
/// ERC-20 `transfer` call data overrides the top-level recipient and value.
pub fn decode_raw(raw_tx: &str) -> Result<DecodedTransaction, ChainError> {
	let envelope = decode_envelope(raw_tx)?;
	let from = envelope
		.recover_signer()
		.map_err(|e| ChainError::Integrity(format!("signature recovery failed: {}", e)))?;

	let top_to = envelope.to();
	let (to, amount, contract_address, kind) = match decode_erc20_transfer(envelope.input()) {
		Some((recipient, amount)) => (
			recipient,
			amount,
			top_to.map(|c| c.to_checksum(None)),
			TransferKind::FungibleToken,
		),
		None if envelope.input().is_empty() => {
			(top_to.unwrap_or_default(), envelope.value(), None, TransferKind::Native)
		},
		None => (
			top_to.unwrap_or_default(),
			envelope.value(),
			top_to.map(|c| c.to_checksum(None)),
			TransferKind::ContractCall,
		),
	};

	Ok(DecodedTransaction {
		hash: envelope.tx_hash().to_string(),
		chain_id: envelope.chain_id(),
		nonce: envelope.nonce(),
		from: from.to_checksum(None),
		to: to.to_checksum(None),
		amount: amount.to_string(),
		contract_address,
		gas_limit: envelope.gas_limit(),
		max_fee_per_gas: envelope.max_fee_per_gas().to_string(),
		max_priority_fee_per_gas: envelope.max_priority_fee_per_gas().map(|v| v.to_string()),
		kind,
	})
}

/// Recovers the signer of a raw transaction, optionally requiring it to match.
pub fn verify_raw(raw_tx: &str, expected_sender: Option<&str>) -> Result<Address, ChainError> {
	let envelope = decode_envelope(raw_tx)?;
	let recovered = envelope
		.recover_signer()
		.map_err(|e| ChainError::Integrity(format!("signature verification failed: {}", e)))?;
	if let Some(expected) = expected_sender {
		let expected = parse_address("expected_sender", expected)?;
		if expected != recovered {
			warn!(%expected, %recovered, "signer mismatch");
			return Err(ChainError::Integrity(format!(
				"signer mismatch: expected {}, recovered {}",
				expected, recovered
			)));
		}
	}
	Ok(recovered)
}

/// Address of a secp256k1 public key given as hex.
///
/// Accepts 65-byte uncompressed (0x04 prefix), 64-byte raw and 33-byte
/// compressed encodings.
pub fn public_key_to_address(public_key: &str) -> Result<Address, ChainError> {
	let bytes = hex::decode(without_0x_prefix(public_key.trim()))
		.map_err(|e| ChainError::InvalidInput(format!("public key is not hex: {}", e)))?;
	match bytes.len() {
		64 => Ok(Address::from_slice(&keccak256(&bytes)[12..])),
		33 | 65 => {
			let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&bytes)
				.map_err(|e| ChainError::InvalidInput(format!("invalid public key: {}", e)))?;
			let point = key.to_encoded_point(false);
			Ok(Address::from_slice(&keccak256(&point.as_bytes()[1..])[12..]))
		},
		n => Err(ChainError::InvalidInput(format!(
			"public key must be 33, 64 or 65 bytes, got {}",
			n
		))),
	}
}

/// `0x` followed by 40 hex digits.
pub fn is_valid_address(address: &str) -> bool {
	let Some(body) = address.strip_prefix("0x") else {
		return false;
	};
	body.len() == 40 && body.bytes().all(|b| b.is_ascii_hexdigit())
}
