//! Configuration for the wallet node.
//!
//! Configuration is TOML. String values may reference the environment as
//! `${VAR}` or `${VAR:-default}`; references are resolved before parsing.
//! A file may pull in others with `include = ["adapters.toml"]`, provided
//! every top-level section is defined exactly once across the file set.

mod loader;

pub use loader::ConfigLoader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// The full error embeds the whole input document.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Root configuration document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	pub service: ServiceConfig,
	pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Identifier included in log output.
	pub id: String,
}

/// Chain adapters to construct, keyed by implementation name.
///
/// Each table is handed verbatim to the matching adapter factory, which
/// validates it against its own schema.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdaptersConfig {
	/// Adapter used when a command names no chain.
	#[serde(default)]
	pub primary: Option<String>,
	pub implementations: HashMap<String, toml::Value>,
}

const MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// Substitutes `${VAR}` and `${VAR:-default}` references.
///
/// Unset variables without a default are an error. Input is capped at 1 MiB
/// and the pattern bounds name and default lengths.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	if input.len() > MAX_CONFIG_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_CONFIG_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut output = String::with_capacity(input.len());
	let mut cursor = 0;
	for cap in re.captures_iter(input) {
		let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(name.as_str()), cap.get(2)) {
			(Ok(v), _) => v,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					name.as_str()
				)))
			},
		};
		output.push_str(&input[cursor..whole.start()]);
		output.push_str(&value);
		cursor = whole.end();
	}
	output.push_str(&input[cursor..]);

	Ok(output)
}

impl Config {
	/// Loads a configuration file together with everything it includes.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = path
			.parent()
			.filter(|p| !p.as_os_str().is_empty())
			.unwrap_or_else(|| Path::new("."));
		let file_name = path.file_name().ok_or_else(|| {
			ConfigError::Validation(format!("Invalid path: {}", path.display()))
		})?;

		ConfigLoader::new(base_dir).load_config(file_name).await
	}

	/// Raw table for one adapter implementation.
	pub fn adapter(&self, name: &str) -> Option<&toml::Value> {
		self.adapters.implementations.get(name)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}
		if self.adapters.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one adapter implementation must be configured".into(),
			));
		}
		for (name, table) in &self.adapters.implementations {
			if !table.is_table() {
				return Err(ConfigError::Validation(format!(
					"Adapter '{}' must be a table, got {}",
					name,
					table.type_str()
				)));
			}
		}
		if let Some(primary) = &self.adapters.primary {
			if !self.adapters.implementations.contains_key(primary) {
				return Err(ConfigError::Validation(format!(
					"Primary adapter '{}' not found in implementations",
					primary
				)));
			}
		}
		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
