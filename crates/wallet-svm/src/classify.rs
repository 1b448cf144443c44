//! Classification of confirmed transactions.
//!
//! Evidence is inspected in priority order: inner SPL token transfers, inner
//! NFT-program transfers, token balance changes, and finally the lamport
//! delta of the receiving account. Token and NFT movements are often wrapped
//! in an outer system instruction, so they are checked first.

use crate::programs::{is_nft_program, SPL_TOKEN_PROGRAM_NAME, SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::types::{ParsedContent, TokenBalance, TransactionMeta, TransactionResult, UiInstruction, UiMessage, UiTransaction};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;
use wallet_types::{BlockHeader, BlockTransaction, ChainError, Transfer, TransferClassification, TxMessage, TxStatus};

/// Classification plus the program or authority that performed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
	pub classification: TransferClassification,
	pub contract_wallet: Option<String>,
}

impl Classified {
	fn new(classification: TransferClassification, contract_wallet: Option<String>) -> Self {
		Self {
			classification,
			contract_wallet,
		}
	}
}

fn info_str(info: &Value, field: &str) -> Option<String> {
	match info.get(field)? {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn require_info(info: &Value, field: &str, kind: &str) -> Result<String, ChainError> {
	info_str(info, field)
		.ok_or_else(|| ChainError::Protocol(format!("{} instruction without '{}'", kind, field)))
}

/// Program id of an instruction, resolving compiled indices through the
/// message's account keys.
fn program_id<'a>(ix: &'a UiInstruction, message: &'a UiMessage) -> Result<&'a str, ChainError> {
	match ix {
		UiInstruction::Parsed { program_id, .. } | UiInstruction::PartiallyDecoded { program_id, .. } => {
			Ok(program_id)
		},
		UiInstruction::Compiled { program_id_index, .. } => message.key(*program_id_index).ok_or_else(|| {
			ChainError::Protocol(format!(
				"program index {} out of range ({} account keys)",
				program_id_index,
				message.account_keys.len()
			))
		}),
	}
}

fn inner_instructions(meta: &TransactionMeta) -> impl Iterator<Item = &UiInstruction> {
	meta.inner_instructions
		.iter()
		.flatten()
		.flat_map(|set| set.instructions.iter())
}

fn inner_token_transfer(meta: &TransactionMeta) -> Result<Option<Classified>, ChainError> {
	for ix in inner_instructions(meta) {
		let UiInstruction::Parsed {
			program,
			parsed: ParsedContent::Typed { kind, info },
			..
		} = ix
		else {
			continue;
		};
		if program != SPL_TOKEN_PROGRAM_NAME || (kind != "transfer" && kind != "transferChecked") {
			continue;
		}

		let amount = info_str(info, "amount")
			.or_else(|| info.get("tokenAmount").and_then(|t| info_str(t, "amount")))
			.ok_or_else(|| ChainError::Protocol(format!("{} instruction without amount", kind)))?;
		let transfer = Transfer {
			from: require_info(info, "source", kind)?,
			to: require_info(info, "destination", kind)?,
			token_address: info_str(info, "mint"),
			amount,
		};
		let authority = info_str(info, "authority").or_else(|| info_str(info, "multisigAuthority"));
		return Ok(Some(Classified::new(
			TransferClassification::FungibleToken(transfer),
			authority,
		)));
	}
	Ok(None)
}

fn inner_nft_transfer(message: &UiMessage, meta: &TransactionMeta) -> Result<Option<Classified>, ChainError> {
	for ix in inner_instructions(meta) {
		let program = program_id(ix, message)?;
		if !is_nft_program(program) {
			continue;
		}
		let UiInstruction::Parsed {
			parsed: ParsedContent::Typed { kind, info },
			..
		} = ix
		else {
			continue;
		};
		if kind != "transfer" {
			continue;
		}

		let from = info_str(info, "owner")
			.or_else(|| info_str(info, "authority"))
			.unwrap_or_default();
		let transfer = Transfer {
			from,
			to: require_info(info, "destination", kind)?,
			token_address: info_str(info, "mint"),
			amount: "1".into(),
		};
		return Ok(Some(Classified::new(
			TransferClassification::Nft(transfer),
			Some(program.to_string()),
		)));
	}
	Ok(None)
}

fn token_units(balance: &TokenBalance) -> Result<u64, ChainError> {
	balance.ui_token_amount.amount.parse().map_err(|_| {
		ChainError::Protocol(format!(
			"invalid token amount '{}' at account {}",
			balance.ui_token_amount.amount, balance.account_index
		))
	})
}

/// Token movement visible only through pre/post token balances, as for a
/// top-level SPL transfer.
///
/// A zero-decimals mint gaining exactly one unit is reported as an NFT.
/// This cannot tell an NFT from a zero-decimals fungible token without a
/// metadata lookup.
fn token_balance_transfer(message: &UiMessage, meta: &TransactionMeta) -> Result<Option<Classified>, ChainError> {
	let pre = meta.pre_token_balances.as_deref().unwrap_or_default();
	let post = meta.post_token_balances.as_deref().unwrap_or_default();
	let owner_of = |b: &TokenBalance| {
		b.owner
			.clone()
			.or_else(|| message.key(b.account_index).map(str::to_string))
			.unwrap_or_default()
	};

	for after in post {
		let before = match pre.iter().find(|b| b.account_index == after.account_index) {
			Some(b) => token_units(b)?,
			None => 0,
		};
		let after_units = token_units(after)?;
		if after_units <= before {
			continue;
		}
		let delta = after_units - before;

		let mut sender = None;
		for b in pre.iter().filter(|b| b.mint == after.mint) {
			let now = match post.iter().find(|p| p.account_index == b.account_index) {
				Some(p) => token_units(p)?,
				None => 0,
			};
			if now < token_units(b)? {
				sender = Some(owner_of(b));
				break;
			}
		}
		let from = sender
			.or_else(|| message.key(0).map(str::to_string))
			.unwrap_or_default();

		let is_nft = after.ui_token_amount.decimals == 0 && delta == 1;
		let transfer = Transfer {
			from,
			to: owner_of(after),
			token_address: Some(after.mint.clone()),
			amount: delta.to_string(),
		};
		let classification = if is_nft {
			TransferClassification::Nft(transfer)
		} else {
			TransferClassification::FungibleToken(transfer)
		};
		return Ok(Some(Classified::new(classification, Some(TOKEN_PROGRAM_ID.to_string()))));
	}
	Ok(None)
}

/// Account-key indices of the first system transfer: `(from, to)`.
fn system_transfer_indices(message: &UiMessage) -> Result<Option<(usize, usize)>, ChainError> {
	let position = |key: &str| message.account_keys.iter().position(|k| k.pubkey() == key);
	for ix in &message.instructions {
		if program_id(ix, message)? != SYSTEM_PROGRAM_ID {
			continue;
		}
		let indices = match ix {
			UiInstruction::Compiled { accounts, .. } if accounts.len() >= 2 => Some((accounts[0], accounts[1])),
			UiInstruction::PartiallyDecoded { accounts, .. } if accounts.len() >= 2 => {
				position(&accounts[0]).zip(position(&accounts[1]))
			},
			UiInstruction::Parsed {
				parsed: ParsedContent::Typed { info, .. },
				..
			} => {
				let source = info_str(info, "source");
				let destination = info_str(info, "destination");
				source
					.and_then(|s| position(&s))
					.zip(destination.and_then(|d| position(&d)))
			},
			_ => None,
		};
		if indices.is_some() {
			return Ok(indices);
		}
	}
	Ok(None)
}

fn native_transfer(message: &UiMessage, meta: &TransactionMeta) -> Result<Classified, ChainError> {
	let (from_index, to_index) = system_transfer_indices(message)?.unwrap_or((0, 1));
	let amount = match (meta.pre_balances.get(to_index), meta.post_balances.get(to_index)) {
		(Some(pre), Some(post)) => post.saturating_sub(*pre),
		_ => {
			warn!(to_index, "balance index out of range");
			0
		},
	};
	let transfer = Transfer {
		from: message.key(from_index).unwrap_or_default().to_string(),
		to: message.key(to_index).unwrap_or_default().to_string(),
		token_address: None,
		amount: amount.to_string(),
	};
	Ok(Classified::new(TransferClassification::Native(transfer), None))
}

/// Classifies one confirmed transaction.
///
/// A failed transaction, or one without metadata, is a zero-amount native
/// transfer between the first two account keys.
pub fn classify_transaction(tx: &UiTransaction, meta: Option<&TransactionMeta>) -> Result<Classified, ChainError> {
	let message = &tx.message;
	let meta = match meta {
		Some(meta) if meta.err.is_none() => meta,
		_ => {
			let bare = Transfer {
				from: message.key(0).unwrap_or_default().to_string(),
				to: message.key(1).unwrap_or_default().to_string(),
				token_address: None,
				amount: "0".into(),
			};
			return Ok(Classified::new(TransferClassification::Native(bare), None));
		},
	};

	if let Some(found) = inner_token_transfer(meta)? {
		return Ok(found);
	}
	if let Some(found) = inner_nft_transfer(message, meta)? {
		return Ok(found);
	}
	if let Some(found) = token_balance_transfer(message, meta)? {
		return Ok(found);
	}
	native_transfer(message, meta)
}

/// Normalized block entry for a classified transaction.
pub fn block_transaction(
	tx: &UiTransaction,
	meta: Option<&TransactionMeta>,
	height: u64,
) -> Result<BlockTransaction, ChainError> {
	let classified = classify_transaction(tx, meta)?;
	let kind = classified.classification.kind();
	let transfer = classified.classification.into_transfer();
	Ok(BlockTransaction {
		hash: tx.signatures.first().cloned().unwrap_or_default(),
		from: transfer.from,
		to: transfer.to,
		amount: transfer.amount,
		token_address: transfer.token_address,
		contract_wallet: classified.contract_wallet,
		height,
		kind,
	})
}

/// Transaction view returned by hash and address lookups.
pub fn tx_message(result: &TransactionResult) -> Result<TxMessage, ChainError> {
	let meta = result.meta.as_ref();
	let classified = classify_transaction(&result.transaction, meta)?;
	let kind = classified.classification.kind();
	let transfer = classified.classification.into_transfer();
	let status = match meta {
		None => TxStatus::Pending,
		Some(m) if m.err.is_some() => TxStatus::Failed,
		Some(_) => TxStatus::Success,
	};
	Ok(TxMessage {
		hash: result.signature().unwrap_or_default().to_string(),
		from: transfer.from,
		to: transfer.to,
		amount: transfer.amount,
		fee: meta.map(|m| m.fee).unwrap_or_default().to_string(),
		status,
		kind,
		contract_address: transfer.token_address,
		height: result.slot,
	})
}

/// Groups fetched transactions into one header per slot, ascending.
///
/// The header hash is the first signature seen in the slot; gas used is the
/// sum of consumed compute units.
pub fn organize_by_slot(results: &[TransactionResult]) -> Vec<BlockHeader> {
	let mut slots: BTreeMap<u64, (BlockHeader, Vec<String>)> = BTreeMap::new();
	for result in results {
		let Some(signature) = result.signature() else {
			continue;
		};
		let (header, hashes) = slots.entry(result.slot).or_insert_with(|| {
			let header = BlockHeader {
				hash: signature.to_string(),
				number: result.slot,
				timestamp: result.block_time.and_then(|t| u64::try_from(t).ok()).unwrap_or_default(),
				..Default::default()
			};
			(header, Vec::new())
		});
		hashes.push(signature.to_string());
		header.gas_used += result
			.meta
			.as_ref()
			.and_then(|m| m.compute_units_consumed)
			.unwrap_or_default();
	}

	slots
		.into_values()
		.map(|(mut header, hashes)| {
			header.extra.insert("tx_count".into(), hashes.len().to_string());
			header.extra.insert("tx_hashes".into(), hashes.join(","));
			header
		})
		.collect()
}
