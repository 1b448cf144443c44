//! JSON-RPC transport shared by the chain clients.
//!
//! [`RpcClient`] posts JSON-RPC 2.0 envelopes over HTTP with a hard deadline
//! per call. Errors are mapped onto [`wallet_types::ChainError`] so chain
//! clients only add operation context.

pub mod client;
pub mod jsonrpc;

pub use client::{BatchCall, RpcClient, RpcOptions};
pub use jsonrpc::{decode_result, ErrorObject, Response};
