//! Solana fee suggestion.
//!
//! The priority component is the 75th percentile of recent per-slot
//! prioritization fees. Tiers scale it by 0.75, 1 and 1.25 on top of the
//! message's base fee.

use crate::client::SvmClient;
use crate::types::PrioritizationFee;
use tracing::debug;
use wallet_types::{ChainError, FeeQuote, FeeTier};

/// `(numerator, denominator, label)` per tier.
const TIERS: [(u128, u128, &str); 3] = [(3, 4, "0.75"), (1, 1, "1"), (5, 4, "1.25")];

/// Fee at sorted index `floor(0.75 * n)`; zero for an empty set.
pub fn suggested_priority_fee(fees: &[PrioritizationFee]) -> u64 {
	let mut values: Vec<u64> = fees.iter().map(|f| f.prioritization_fee).collect();
	if values.is_empty() {
		return 0;
	}
	values.sort_unstable();
	values[values.len() * 3 / 4]
}

pub fn fee_quote(base_fee: u64, priority_fee: u64) -> FeeQuote {
	let [slow, normal, fast] = TIERS.map(|(numerator, denominator, label)| {
		let scaled = u128::from(priority_fee) * numerator / denominator;
		FeeTier {
			base_fee: base_fee.to_string(),
			priority_fee: scaled.to_string(),
			multiplier: label.to_string(),
			gas_price: (u128::from(base_fee) + scaled).to_string(),
		}
	});
	FeeQuote { slow, normal, fast }
}

/// Quotes a fee for `message`, a base64 serialized message.
pub async fn suggest_fee(client: &SvmClient, message: &str) -> Result<FeeQuote, ChainError> {
	let (base_fee, fees) = tokio::try_join!(
		client.get_fee_for_message(message),
		client.get_recent_prioritization_fees()
	)?;
	let priority_fee = suggested_priority_fee(&fees);
	debug!(base_fee, priority_fee, samples = fees.len(), "suggested fee");
	Ok(fee_quote(base_fee, priority_fee))
}
