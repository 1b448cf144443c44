//! Hex and amount helpers shared by both codecs.

use crate::ChainError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Shortens an identifier for log output.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(10) {
		Some((cut, _)) => format!("{}..", &id[..cut]),
		None => id.to_string(),
	}
}

pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.starts_with("0x") || hex_str.starts_with("0X") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Converts a human decimal amount into integer base units.
///
/// Digits beyond `decimals` places are truncated. Negative and overflowing
/// amounts are rejected.
pub fn scale_decimal(value: &str, decimals: u32) -> Result<u64, ChainError> {
	let parsed = Decimal::from_str(value.trim())
		.map_err(|e| ChainError::InvalidInput(format!("invalid amount '{}': {}", value, e)))?;
	if parsed.is_sign_negative() {
		return Err(ChainError::InvalidInput(format!(
			"amount must not be negative: {}",
			value
		)));
	}
	let factor = 10u64
		.checked_pow(decimals)
		.map(Decimal::from)
		.ok_or_else(|| ChainError::InvalidInput(format!("unsupported decimals: {}", decimals)))?;
	let scaled = parsed
		.checked_mul(factor)
		.ok_or_else(|| ChainError::InvalidInput(format!("amount overflows: {}", value)))?
		.trunc();
	u64::try_from(scaled)
		.map_err(|_| ChainError::InvalidInput(format!("amount out of range: {}", value)))
}

/// Renders integer base units as a decimal string with exactly `decimals`
/// fractional places.
pub fn format_base_units(raw: u64, decimals: u32) -> String {
	let mut value = Decimal::from(raw);
	if value.set_scale(decimals).is_err() {
		return raw.to_string();
	}
	value.to_string()
}
