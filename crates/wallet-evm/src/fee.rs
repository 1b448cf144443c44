//! EVM fee suggestion.
//!
//! The node's gas price and priority-fee suggestion are passed through
//! unchanged. Faster tiers only carry a multiplier for the caller to apply.

use crate::client::EvmClient;
use alloy_primitives::U256;
use wallet_types::{ChainError, FeeQuote, FeeTier};

const TIER_MULTIPLIERS: [u8; 3] = [1, 2, 3];

/// Builds the slow/normal/fast quote from node suggestions.
pub fn fee_quote(gas_price: U256, priority_fee: U256) -> FeeQuote {
	let [slow, normal, fast] = TIER_MULTIPLIERS.map(|multiplier| FeeTier {
		base_fee: gas_price.to_string(),
		priority_fee: priority_fee.to_string(),
		multiplier: multiplier.to_string(),
		gas_price: gas_price.to_string(),
	});
	FeeQuote { slow, normal, fast }
}

/// Queries `eth_gasPrice` and `eth_maxPriorityFeePerGas` concurrently.
pub async fn suggest_fee(client: &EvmClient) -> Result<FeeQuote, ChainError> {
	let (gas_price, tip) = tokio::try_join!(client.suggest_gas_price(), client.suggest_gas_tip_cap())?;
	Ok(fee_quote(gas_price, tip))
}
