//! EVM chain support: JSON-RPC client, EIP-1559 transaction codec and fee
//! suggestion.

pub mod client;
pub mod codec;
pub mod fee;
pub mod types;

pub use client::{EvmClient, RESTRICTED_BATCH_CHAIN_IDS};
pub use codec::{DecodedTransaction, Eip1559DynamicFeeTx};
pub use types::{BlockNumber, EvmHeader, FilterQuery, Logs, RpcBlock, RpcLog, RpcReceipt, RpcTransaction};
