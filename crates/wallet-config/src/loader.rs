//! Multi-file configuration loading.
//!
//! Includes are resolved depth-first relative to the loader's base directory.
//! Included files may include further files. A file reached twice is treated
//! as a cycle, and a top-level section defined in two files is rejected.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader {
	base_path: PathBuf,
	visited: HashSet<PathBuf>,
	/// Section name to the file that defined it.
	owners: BTreeMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			visited: HashSet::new(),
			owners: BTreeMap::new(),
		}
	}

	/// Loads `config_path` and its includes into one validated [`Config`].
	pub async fn load_config(&mut self, config_path: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let mut merged = toml::Table::new();
		self.collect(config_path.as_ref(), &mut merged).await?;

		let document = toml::to_string(&merged).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize combined config: {}", e))
		})?;
		document.parse()
	}

	/// Reads one file, then recurses into its includes before merging its sections.
	async fn collect(&mut self, path: &Path, merged: &mut toml::Table) -> Result<(), ConfigError> {
		let resolved = self.resolve_path(path)?;
		let canonical = tokio::fs::canonicalize(&resolved).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot resolve path {}: {}", resolved.display(), e),
			))
		})?;
		if !self.visited.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let raw = tokio::fs::read_to_string(&resolved).await?;
		let mut table: toml::Table = toml::from_str(&resolve_env_vars(&raw)?)?;
		let includes = take_includes(&mut table)?;
		debug!(file = %resolved.display(), includes = includes.len(), "loaded config file");

		for (section, value) in table {
			if let Some(owner) = self.owners.get(&section) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}. \
					Each top-level section must be unique across all configuration files.",
					section,
					owner.display(),
					resolved.display()
				)));
			}
			self.owners.insert(section.clone(), resolved.clone());
			merged.insert(section, value);
		}

		for include in includes {
			Box::pin(self.collect(&include, merged)).await?;
		}
		Ok(())
	}

	fn resolve_path(&self, path: &Path) -> Result<PathBuf, ConfigError> {
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};
		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}
		Ok(resolved)
	}
}

/// Removes and returns the `include` directive, accepting a string or a list.
fn take_includes(table: &mut toml::Table) -> Result<Vec<PathBuf>, ConfigError> {
	match table.remove("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				_ => Err(ConfigError::Validation(
					"Include array must contain only strings".into(),
				)),
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}
