//! Schema checks for adapter configuration tables.
//!
//! Each adapter publishes a [`Schema`] describing the keys it reads from its
//! `[adapters.implementations.<name>]` table. The schema is applied before the
//! adapter dials its node so misconfiguration is reported without network I/O.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: &'static str,
		actual: String,
	},
	#[error("Failed to deserialize config: {0}")]
	DeserializationError(String),
}

impl ValidationError {
	/// Qualifies the offending field with its parent table.
	fn nested_under(self, parent: &str) -> Self {
		let join = |child: String| format!("{}.{}", parent, child);
		match self {
			ValidationError::MissingField(f) => ValidationError::MissingField(join(f)),
			ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
				field: join(field),
				message,
			},
			ValidationError::TypeMismatch {
				field,
				expected,
				actual,
			} => ValidationError::TypeMismatch {
				field: join(field),
				expected,
				actual,
			},
			other => other,
		}
	}
}

/// Accepted shape of a configuration value.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// String that must start with `http://` or `https://`.
	Url,
	Integer {
		min: Option<i64>,
		max: Option<i64>,
	},
	Boolean,
	/// String restricted to a fixed set of values.
	OneOf(&'static [&'static str]),
	Table(Schema),
}

impl FieldType {
	fn check(&self, field: &str, value: &toml::Value) -> Result<(), ValidationError> {
		let mismatch = |expected: &'static str| ValidationError::TypeMismatch {
			field: field.to_string(),
			expected,
			actual: value.type_str().to_string(),
		};
		let invalid = |message: String| ValidationError::InvalidValue {
			field: field.to_string(),
			message,
		};

		match self {
			FieldType::String => {
				value.as_str().ok_or_else(|| mismatch("string"))?;
			},
			FieldType::Url => {
				let url = value.as_str().ok_or_else(|| mismatch("url string"))?;
				if !(url.starts_with("http://") || url.starts_with("https://")) {
					return Err(invalid(format!("'{}' is not an http(s) URL", url)));
				}
			},
			FieldType::Integer { min, max } => {
				let n = value.as_integer().ok_or_else(|| mismatch("integer"))?;
				if let Some(lo) = min.filter(|lo| n < *lo) {
					return Err(invalid(format!("{} is below minimum {}", n, lo)));
				}
				if let Some(hi) = max.filter(|hi| n > *hi) {
					return Err(invalid(format!("{} is above maximum {}", n, hi)));
				}
			},
			FieldType::Boolean => {
				value.as_bool().ok_or_else(|| mismatch("boolean"))?;
			},
			FieldType::OneOf(allowed) => {
				let s = value.as_str().ok_or_else(|| mismatch("string"))?;
				if !allowed.contains(&s) {
					return Err(invalid(format!(
						"'{}' is not one of [{}]",
						s,
						allowed.join(", ")
					)));
				}
			},
			FieldType::Table(schema) => {
				schema.validate(value).map_err(|e| e.nested_under(field))?;
			},
		}
		Ok(())
	}
}

pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// Named configuration key with a type and optional extra check.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("has_validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a check that runs after the type check passes.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn apply(&self, value: &toml::Value) -> Result<(), ValidationError> {
		self.field_type.check(&self.name, value)?;
		match &self.validator {
			Some(validator) => validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			}),
			None => Ok(()),
		}
	}
}

/// Required and optional keys of one configuration table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table",
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.apply(value)?;
		}
		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.apply(value)?;
			}
		}
		Ok(())
	}
}

/// Polymorphic config check exposed by each adapter implementation.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
