//! Common types for the multi-chain wallet backend.
//!
//! Every chain adapter speaks in these types so callers never see a
//! chain-specific wire format. The crate also hosts the error taxonomy,
//! the request envelope shared by all capability methods, and the
//! configuration-schema helpers used by adapter factories.

/// Account and fee snapshots.
pub mod account;
/// Block, header and normalized block-transaction types.
pub mod block;
/// Error taxonomy shared by every chain client and adapter.
pub mod error;
/// Implementation registry trait for config-driven factories.
pub mod registry;
/// Capability request envelope and request bodies.
pub mod request;
/// Transaction lifecycle and classification types.
pub mod transaction;
/// Hex and amount helpers.
pub mod utils;
/// Configuration validation types.
pub mod validation;

pub use account::*;
pub use block::*;
pub use error::*;
pub use registry::ImplementationRegistry;
pub use request::*;
pub use transaction::*;
pub use utils::{format_base_units, scale_decimal, truncate_id, with_0x_prefix, without_0x_prefix};
pub use validation::*;
