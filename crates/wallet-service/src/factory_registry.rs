//! Dynamic factory registry for chain adapters.
//!
//! Adapter crates publish their factories through `get_all_implementations`;
//! the registry collects them once and the configuration decides which ones
//! are constructed.

use std::collections::HashMap;
use std::sync::OnceLock;
use wallet_adapter::{AdapterFactory, AdapterService};
use wallet_config::Config;

/// Global registry for all adapter factories
pub struct FactoryRegistry {
	pub adapters: HashMap<String, AdapterFactory>,
}

impl FactoryRegistry {
	/// Create a new empty registry
	pub fn new() -> Self {
		Self {
			adapters: HashMap::new(),
		}
	}

	/// Register an adapter implementation
	pub fn register_adapter(&mut self, name: impl Into<String>, factory: AdapterFactory) {
		self.adapters.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Initialize the global registry with all available implementations
pub fn initialize_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();
		for (name, factory) in wallet_adapter::get_all_implementations() {
			tracing::debug!("Registering adapter implementation: {}", name);
			registry.register_adapter(name, factory);
		}
		registry
	})
}

pub fn get_registry() -> &'static FactoryRegistry {
	initialize_registry()
}

/// Macro to build factories from config implementations
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = Vec::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.push((name.clone(), *factory));
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories.sort_by(|a, b| a.0.cmp(&b.0));
		factories
	}};
}

/// Adapters built from configuration, plus the chain served by the primary
/// implementation when one is named.
pub struct WalletNode {
	pub service: AdapterService,
	pub primary_chain: Option<String>,
}

/// Constructs every configured adapter.
///
/// Factories dial their node while running, so this must be called from a
/// multi-threaded runtime.
pub fn build_node_from_config(config: &Config) -> Result<WalletNode, Box<dyn std::error::Error>> {
	let registry = get_registry();
	let factories = build_factories!(registry, config.adapters.implementations, adapters, "adapter");

	let mut adapters = Vec::with_capacity(factories.len());
	let mut primary_chain = None;
	for (name, factory) in factories {
		let Some(table) = config.adapter(&name) else {
			continue;
		};
		let adapter = factory(table).map_err(|e| format!("Failed to create adapter '{}': {}", name, e))?;
		tracing::info!(implementation = %name, chain = %adapter.chain(), network = %adapter.network(), "adapter ready");
		if config.adapters.primary.as_deref() == Some(name.as_str()) {
			primary_chain = Some(adapter.chain().to_string());
		}
		adapters.push(adapter);
	}

	Ok(WalletNode {
		service: AdapterService::new(adapters),
		primary_chain,
	})
}
