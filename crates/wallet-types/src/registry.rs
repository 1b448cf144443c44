//! Registration contract for chain adapter implementations.

/// Ties a configuration key to the factory that builds the implementation.
///
/// The key matches the table name under `[adapters.implementations]`,
/// e.g. `ethereum` or `solana`.
pub trait ImplementationRegistry {
	const NAME: &'static str;

	type Factory;

	fn factory() -> Self::Factory;
}
