//! Solana transaction construction, signature attachment and decoding.
//!
//! Requests arrive as base64-encoded JSON [`TxStructure`]. Building resolves
//! the mint's decimals and whether the recipient's associated token account
//! exists, and writes both back into the returned inputs so the attach call
//! rebuilds a byte-identical message without consulting the node again.

use crate::client::SvmClient;
use crate::programs::{
	ASSOCIATED_TOKEN_PROGRAM, ASSOCIATED_TOKEN_PROGRAM_ID, RENT_SYSVAR, SYSTEM_PROGRAM, SYSTEM_PROGRAM_ID,
	TOKEN_PROGRAM, TOKEN_PROGRAM_ID,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::str::FromStr;
use tracing::{debug, warn};
use wallet_types::{
	format_base_units, scale_decimal, without_0x_prefix, ChainError, ErrorKind, SignedTransaction,
	UnsignedTransaction,
};

/// Decimals of native SOL.
pub const SOL_DECIMALS: u8 = 9;

const SYSTEM_TRANSFER_TAG: u32 = 2;
const TOKEN_TRANSFER_TAG: u8 = 3;
const TOKEN_TRANSFER_CHECKED_TAG: u8 = 12;

/// Logical Solana transfer request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStructure {
	pub from: String,
	pub to: String,
	/// Human decimal amount: SOL, or whole tokens for SPL transfers.
	pub value: String,
	/// Recent blockhash.
	pub nonce: String,
	/// Token mint. Empty or `0x00` selects a native transfer.
	#[serde(default)]
	pub contract_address: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub signature: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub decimals: Option<u8>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub create_associated_account: Option<bool>,
}

impl TxStructure {
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
		let contract = self.contract_address.trim();
		contract.is_empty() || contract == "0x00"
	}

	/// Whether everything the builder needs from the node is already present.
	pub fn is_resolved(&self) -> bool {
		self.is_native() || (self.decimals.is_some() && self.create_associated_account.is_some())
	}
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey, ChainError> {
	Pubkey::from_str(value.trim())
		.map_err(|e| ChainError::InvalidInput(format!("invalid {} '{}': {}", field, value, e)))
}

/// Deterministic token account of `owner` for `mint`.
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
	Pubkey::find_program_address(
		&[owner.as_ref(), TOKEN_PROGRAM.as_ref(), mint.as_ref()],
		&ASSOCIATED_TOKEN_PROGRAM,
	)
	.0
}

pub fn system_transfer_instruction(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
	let mut data = SYSTEM_TRANSFER_TAG.to_le_bytes().to_vec();
	data.extend_from_slice(&lamports.to_le_bytes());
	Instruction::new_with_bytes(
		SYSTEM_PROGRAM,
		&data,
		vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
	)
}

pub fn token_transfer_instruction(source: &Pubkey, destination: &Pubkey, authority: &Pubkey, amount: u64) -> Instruction {
	let mut data = vec![TOKEN_TRANSFER_TAG];
	data.extend_from_slice(&amount.to_le_bytes());
	Instruction::new_with_bytes(
		TOKEN_PROGRAM,
		&data,
		vec![
			AccountMeta::new(*source, false),
			AccountMeta::new(*destination, false),
			AccountMeta::new_readonly(*authority, true),
		],
	)
}

pub fn create_associated_account_instruction(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
	Instruction::new_with_bytes(
		ASSOCIATED_TOKEN_PROGRAM,
		&[],
		vec![
			AccountMeta::new(*payer, true),
			AccountMeta::new(associated_token_address(owner, mint), false),
			AccountMeta::new_readonly(*owner, false),
			AccountMeta::new_readonly(*mint, false),
			AccountMeta::new_readonly(SYSTEM_PROGRAM, false),
			AccountMeta::new_readonly(TOKEN_PROGRAM, false),
			AccountMeta::new_readonly(RENT_SYSVAR, false),
		],
	)
}

/// Fills in the mint decimals and the recipient account check for SPL
/// transfers. Values already present in the request are kept.
pub async fn resolve(client: &SvmClient, request: &TxStructure) -> Result<TxStructure, ChainError> {
	let mut resolved = request.clone();
	if request.is_resolved() {
		return Ok(resolved);
	}
	let mint = parse_pubkey("contract_address", &request.contract_address)?;
	let to = parse_pubkey("to", &request.to)?;

	if resolved.decimals.is_none() {
		let supply = client
			.get_token_supply(&mint.to_string())
			.await
			.map_err(|e| e.context("mint decimals"))?;
		resolved.decimals = Some(supply.decimals);
	}
	if resolved.create_associated_account.is_none() {
		let ata = associated_token_address(&to, &mint);
		let missing = match client.get_account_info(&ata.to_string()).await {
			Ok(_) => false,
			Err(e) if e.kind() == ErrorKind::NotFound => true,
			Err(e) => return Err(e.context("recipient token account")),
		};
		debug!(%ata, missing, "resolved recipient token account");
		resolved.create_associated_account = Some(missing);
	}
	Ok(resolved)
}

/// Builds the unsigned transaction from a resolved request.
pub fn build_transaction(request: &TxStructure) -> Result<Transaction, ChainError> {
	let from = parse_pubkey("from", &request.from)?;
	let to = parse_pubkey("to", &request.to)?;
	let blockhash = Hash::from_str(request.nonce.trim())
		.map_err(|e| ChainError::InvalidInput(format!("invalid nonce '{}': {}", request.nonce, e)))?;

	let instructions = if request.is_native() {
		let lamports = scale_decimal(&request.value, u32::from(SOL_DECIMALS))?;
		vec![system_transfer_instruction(&from, &to, lamports)]
	} else {
		let mint = parse_pubkey("contract_address", &request.contract_address)?;
		let (Some(decimals), Some(create)) = (request.decimals, request.create_associated_account) else {
			return Err(ChainError::InvalidInput(
				"token transfer request is missing resolved decimals".into(),
			));
		};
		let amount = scale_decimal(&request.value, u32::from(decimals))?;
		let source = associated_token_address(&from, &mint);
		let destination = associated_token_address(&to, &mint);

		let mut instructions = Vec::with_capacity(2);
		if create {
			instructions.push(create_associated_account_instruction(&from, &to, &mint));
		}
		instructions.push(token_transfer_instruction(&source, &destination, &from, amount));
		instructions
	};

	let message = Message::new_with_blockhash(&instructions, Some(&from), &blockhash);
	Ok(Transaction::new_unsigned(message))
}

/// Serialized message for the external signer, plus the resolved request
/// to resubmit.
pub fn build_unsigned(request: &TxStructure) -> Result<UnsignedTransaction, ChainError> {
	let tx = build_transaction(request)?;
	Ok(UnsignedTransaction {
		payload: hex::encode(tx.message.serialize()),
		inputs: request.to_base64()?,
	})
}

fn parse_signature(signature: &str) -> Result<Signature, ChainError> {
	let bytes = hex::decode(without_0x_prefix(signature.trim()))
		.map_err(|e| ChainError::InvalidInput(format!("signature is not hex: {}", e)))?;
	Signature::try_from(bytes.as_slice()).map_err(|_| {
		ChainError::InvalidInput(format!("signature must be 64 bytes, got {}", bytes.len()))
	})
}

/// Inserts the fee payer's signature and encodes the transaction as base58.
///
/// A signature that does not verify is logged and the transaction is still
/// returned; the node rejects it on broadcast.
pub fn attach_signature(request: &TxStructure, signature: &str) -> Result<SignedTransaction, ChainError> {
	let signature = parse_signature(signature)?;
	let mut tx = build_transaction(request)?;
	match tx.signatures.first_mut() {
		Some(slot) => *slot = signature,
		None => return Err(ChainError::Protocol("message requires no signatures".into())),
	}
	if let Err(e) = tx.verify() {
		warn!(from = %request.from, error = %e, "attached signature does not verify");
	}

	let bytes = bincode::serialize(&tx)
		.map_err(|e| ChainError::Protocol(format!("failed to serialize transaction: {}", e)))?;
	Ok(SignedTransaction {
		raw_tx: bs58::encode(bytes).into_string(),
		tx_hash: signature.to_string(),
	})
}

fn decode_transaction(raw_tx: &str) -> Result<Transaction, ChainError> {
	let bytes = bs58::decode(raw_tx.trim())
		.into_vec()
		.map_err(|e| ChainError::InvalidInput(format!("transaction is not base58: {}", e)))?;
	bincode::deserialize(&bytes)
		.map_err(|e| ChainError::InvalidInput(format!("malformed transaction: {}", e)))
}

/// Normalized view of a raw transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedTransaction {
	pub from: String,
	pub to: String,
	/// SOL for native transfers, token base units otherwise.
	pub value: String,
	/// Recent blockhash.
	pub nonce: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub contract_address: String,
	/// Hex of the first signature.
	pub signature: String,
}


fn le_u64(data: &[u8]) -> Option<u64> {
	data.get(..8)
		.and_then(|bytes| bytes.try_into().ok())
		.map(u64::from_le_bytes)
}

/// Decodes a base58 transaction into its transfer description.
///
/// Later transfer instructions overwrite earlier ones; associated token
/// account instructions are skipped.
pub fn decode_raw(raw_tx: &str) -> Result<DecodedTransaction, ChainError> {
	let tx = decode_transaction(raw_tx)?;
	let keys = &tx.message.account_keys;
	let key = |index: u8| keys.get(usize::from(index)).map(|k| k.to_string()).unwrap_or_default();

	let mut decoded = DecodedTransaction {
		from: keys.first().map(|k| k.to_string()).unwrap_or_default(),
		nonce: tx.message.recent_blockhash.to_string(),
		signature: tx.signatures.first().map(|s| hex::encode(s.as_ref())).unwrap_or_default(),
		..Default::default()
	};

	for ix in &tx.message.instructions {
		let program = key(ix.program_id_index);
		let account = |n: usize| ix.accounts.get(n).map(|i| key(*i)).unwrap_or_default();
		match program.as_str() {
			SYSTEM_PROGRAM_ID => {
				let tag = ix.data.get(..4).and_then(|b| b.try_into().ok()).map(u32::from_le_bytes);
				if tag != Some(SYSTEM_TRANSFER_TAG) {
					continue;
				}
				let lamports = le_u64(&ix.data[4..])
					.ok_or_else(|| ChainError::InvalidInput("truncated system transfer".into()))?;
				decoded.value = format_base_units(lamports, u32::from(SOL_DECIMALS));
				decoded.to = account(1);
				decoded.contract_address.clear();
			},
			TOKEN_PROGRAM_ID => match ix.data.first() {
				Some(&TOKEN_TRANSFER_TAG) => {
					let amount = le_u64(&ix.data[1..])
						.ok_or_else(|| ChainError::InvalidInput("truncated token transfer".into()))?;
					decoded.value = amount.to_string();
					decoded.to = account(1);
					decoded.contract_address = program;
				},
				Some(&TOKEN_TRANSFER_CHECKED_TAG) => {
					decoded.value = "1".into();
					decoded.contract_address = account(1);
					decoded.to = account(2);
				},
				_ => {},
			},
			ASSOCIATED_TOKEN_PROGRAM_ID => continue,
			_ => {},
		}
	}
	Ok(decoded)
}

/// Verifies every signature of a base58 transaction and returns the fee payer.
pub fn verify_raw(raw_tx: &str) -> Result<String, ChainError> {
	let tx = decode_transaction(raw_tx)?;
	tx.verify().map_err(|e| {
		warn!(error = %e, "transaction signature verification failed");
		ChainError::Integrity(format!("signature verification failed: {}", e))
	})?;
	tx.message
		.account_keys
		.first()
		.map(|k| k.to_string())
		.ok_or_else(|| ChainError::Protocol("transaction has no account keys".into()))
}

/// Base58 address of a 32-byte Ed25519 public key given as hex.
pub fn public_key_to_address(public_key: &str) -> Result<String, ChainError> {
	let hex_key = without_0x_prefix(public_key.trim());
	if hex_key.len() != 64 {
		return Err(ChainError::InvalidInput(format!(
			"public key must be 64 hex chars, got {}",
			hex_key.len()
		)));
	}
	let bytes: [u8; 32] = hex::decode(hex_key)
		.map_err(|e| ChainError::InvalidInput(format!("public key is not hex: {}", e)))?
		.try_into()
		.map_err(|_| ChainError::InvalidInput("public key must be 32 bytes".into()))?;
	Ok(Pubkey::new_from_array(bytes).to_string())
}

pub fn is_valid_address(address: &str) -> bool {
	(43..=44).contains(&address.len())
		&& bs58::decode(address)
			.into_vec()
			.is_ok_and(|bytes| bytes.len() == 32)
}

#[cfg(test)]
mod tests {
	use super::*;
	use solana_sdk::signature::Keypair;
	use solana_sdk::signer::Signer;

	const BLOCKHASH: &str = "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N";

	fn native_request(from: &Keypair, to: &Pubkey, value: &str) -> TxStructure {
		TxStructure {
			from: from.pubkey().to_string(),
			to: to.to_string(),
			value: value.into(),
			nonce: BLOCKHASH.into(),
			..Default::default()
		}
	}

	#[test]
	fn test_native_build_contains_one_system_transfer() {
		let from = Keypair::new();
		let to = Pubkey::new_unique();
		let unsigned = build_unsigned(&native_request(&from, &to, "1.5")).unwrap();

		let message: Message = bincode::deserialize(&hex::decode(&unsigned.payload).unwrap()).unwrap();
		assert_eq!(message.instructions.len(), 1);
		let ix = &message.instructions[0];
		assert_eq!(message.account_keys[usize::from(ix.program_id_index)], SYSTEM_PROGRAM);
		assert_eq!(&ix.data[..4], &[2, 0, 0, 0]);
		assert_eq!(le_u64(&ix.data[4..]), Some(1_500_000_000));
		assert_eq!(message.account_keys[0], from.pubkey());
	}

	#[test]
	fn test_sign_attach_verify_round_trip() {
		let from = Keypair::new();
		let to = Pubkey::new_unique();
		let request = native_request(&from, &to, "0.25");
		let unsigned = build_unsigned(&request).unwrap();

		let signature = from.sign_message(&hex::decode(&unsigned.payload).unwrap());
		let resubmitted = TxStructure::from_base64(&unsigned.inputs).unwrap();
		let signed = attach_signature(&resubmitted, &hex::encode(signature.as_ref())).unwrap();
		assert_eq!(signed.tx_hash, signature.to_string());
		assert_eq!(verify_raw(&signed.raw_tx).unwrap(), from.pubkey().to_string());

		let decoded = decode_raw(&signed.raw_tx).unwrap();
		assert_eq!(decoded.value, "0.250000000");
		assert_eq!(decoded.to, to.to_string());
		assert_eq!(decoded.nonce, BLOCKHASH);
		assert_eq!(decoded.signature, hex::encode(signature.as_ref()));
	}

	#[test]
	fn test_wrong_signer_fails_verification() {
		let from = Keypair::new();
		let impostor = Keypair::new();
		let request = native_request(&from, &Pubkey::new_unique(), "1");
		let unsigned = build_unsigned(&request).unwrap();

		let signature = impostor.sign_message(&hex::decode(&unsigned.payload).unwrap());
		let signed = attach_signature(&request, &hex::encode(signature.as_ref())).unwrap();
		let err = verify_raw(&signed.raw_tx).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Integrity);
	}

	#[test]
	fn test_mismatched_signature_still_encodes() {
		let from = Keypair::new();
		let request = native_request(&from, &Pubkey::new_unique(), "0.1");
		let bogus = hex::encode([7u8; 64]);

		let signed = attach_signature(&request, &bogus).unwrap();
		assert!(bs58::decode(&signed.raw_tx).into_vec().is_ok());
		assert_eq!(signed.tx_hash, Signature::from([7u8; 64]).to_string());
		assert_eq!(decode_raw(&signed.raw_tx).unwrap().signature, bogus);

		let err = verify_raw(&signed.raw_tx).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Integrity);
	}

	#[test]
	fn test_token_build_creates_missing_account() {
		let from = Keypair::new();
		let to = Pubkey::new_unique();
		let mint = Pubkey::new_unique();
		let request = TxStructure {
			contract_address: mint.to_string(),
			decimals: Some(6),
			create_associated_account: Some(true),
			..native_request(&from, &to, "2.5")
		};
		let tx = build_transaction(&request).unwrap();
		let keys = &tx.message.account_keys;
		let programs: Vec<Pubkey> = tx
			.message
			.instructions
			.iter()
			.map(|ix| keys[usize::from(ix.program_id_index)])
			.collect();
		assert_eq!(programs, vec![ASSOCIATED_TOKEN_PROGRAM, TOKEN_PROGRAM]);

		let transfer = &tx.message.instructions[1];
		assert_eq!(transfer.data[0], 3);
		assert_eq!(le_u64(&transfer.data[1..]), Some(2_500_000));
		assert_eq!(
			keys[usize::from(transfer.accounts[1])],
			associated_token_address(&to, &mint)
		);

		let decoded = decode_raw(&bs58::encode(bincode::serialize(&tx).unwrap()).into_string()).unwrap();
		assert_eq!(decoded.value, "2500000");
		assert_eq!(decoded.contract_address, TOKEN_PROGRAM_ID);
	}

	#[test]
	fn test_unresolved_token_request_is_rejected() {
		let from = Keypair::new();
		let request = TxStructure {
			contract_address: Pubkey::new_unique().to_string(),
			..native_request(&from, &Pubkey::new_unique(), "1")
		};
		assert!(!request.is_resolved());
		let err = build_transaction(&request).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvalidInput);
	}

	#[test]
	fn test_short_signature_rejected() {
		let from = Keypair::new();
		let request = native_request(&from, &Pubkey::new_unique(), "1");
		let err = attach_signature(&request, &hex::encode([1u8; 63])).unwrap_err();
		assert!(err.to_string().contains("64 bytes"));
	}

	#[test]
	fn test_addresses() {
		let key = Keypair::new().pubkey();
		let address = public_key_to_address(&format!("0x{}", hex::encode(key.to_bytes()))).unwrap();
		assert_eq!(address, key.to_string());
		assert!(is_valid_address(TOKEN_PROGRAM_ID));
		assert!(!is_valid_address(SYSTEM_PROGRAM_ID));
		assert!(!is_valid_address("0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OI"));
		assert!(public_key_to_address("abcd").is_err());
	}
}
