//! Environment variable access with prefix support

use std::env;

/// Default prefix for sieve variables.
pub const DEFAULT_PREFIX: &str = "SIEVE_";

/// Environment reader scoped to a prefix.
#[derive(Debug, Clone)]
pub struct Env {
	/// Prefix prepended to every key (e.g., "SIEVE_")
	pub prefix: Option<String>,
}

impl Env {
	/// Create an Env without prefix
	pub fn new() -> Self {
		Self { prefix: None }
	}

	/// Set a prefix for all lookups
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	fn key_name(&self, key: &str) -> String {
		match &self.prefix {
			Some(prefix) => format!("{}{}", prefix, key),
			None => key.to_string(),
		}
	}

	fn raw(&self, key: &str) -> Result<Option<(String, String)>, EnvError> {
		let full_key = self.key_name(key);
		validate_env_var_name(&full_key)?;
		Ok(env::var(&full_key).ok().map(|val| (full_key, val)))
	}

	/// Read a float, falling back to `default` when unset
	pub fn float_with_default(&self, key: &str, default: f64) -> Result<f64, EnvError> {
		match self.raw(key)? {
			Some((full_key, val)) => val.trim().parse::<f64>().map_err(|e| EnvError::ParseError {
				key: full_key,
				value_len: val.len(),
				error: e.to_string(),
			}),
			None => Ok(default),
		}
	}

	/// Read a boolean, falling back to `default` when unset
	pub fn bool_with_default(&self, key: &str, default: bool) -> Result<bool, EnvError> {
		match self.raw(key)? {
			Some((full_key, val)) => parse_bool(&val).map_err(|error| EnvError::ParseError {
				key: full_key,
				value_len: val.len(),
				error,
			}),
			None => Ok(default),
		}
	}
}

impl Default for Env {
	fn default() -> Self {
		Self::new()
	}
}

/// Parses the usual spellings of a boolean.
pub fn parse_bool(value: &str) -> Result<bool, String> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		other => Err(format!("'{}' is not a boolean", other)),
	}
}

/// Rejects empty names and names containing `=` or control characters.
pub fn validate_env_var_name(name: &str) -> Result<(), EnvError> {
	if name.is_empty() {
		return Err(EnvError::InvalidVariableName {
			name: name.to_string(),
			reason: "environment variable name must not be empty".to_string(),
		});
	}
	if name.contains('=') || name.contains(|c: char| c.is_control()) {
		return Err(EnvError::InvalidVariableName {
			name: name.to_string(),
			reason: "environment variable name must not contain '=' or control characters"
				.to_string(),
		});
	}
	Ok(())
}

/// Environment variable errors
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
	#[error("Failed to parse environment variable '{key}' (value length: {value_len}): {error}")]
	ParseError {
		key: String,
		value_len: usize,
		error: String,
	},

	#[error("Invalid environment variable name '{name}': {reason}")]
	InvalidVariableName { name: String, reason: String },
}
