//! Solana chain support: JSON-RPC client with a bounded-concurrency range
//! fetcher, transaction codec, confirmed-transaction classification and fee
//! suggestion.

pub mod classify;
pub mod client;
pub mod codec;
pub mod fee;
pub mod programs;
pub mod range;
pub mod types;

pub use classify::{classify_transaction, organize_by_slot, Classified};
pub use client::{validate_signature, SvmClient, MAX_BLOCKS_LIMIT};
pub use codec::{DecodedTransaction, TxStructure};
pub use types::{
	BlockResult, Commitment, HealthStatus, SignaturesQuery, SimulateOptions, TransactionDetails, TransactionResult,
};
