//! Parser settings

use serde::{Deserialize, Serialize};

use crate::env::{DEFAULT_PREFIX, Env, EnvError};

/// Default maximum upload size in MiB.
pub const DEFAULT_MAX_UPLOAD_SIZE: f64 = 10.0;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Source of the request body size limit.
///
/// The limit is expressed in MiB as a float so fractional limits such as
/// `0.5` are possible.
pub trait UploadLimit: Send + Sync {
	/// Maximum accepted body size in MiB
	fn max_upload_size_mib(&self) -> f64;

	/// Maximum accepted body size in bytes.
	///
	/// Negative and NaN limits map to `0`; overflowing limits saturate.
	fn max_body_bytes(&self) -> u64 {
		(self.max_upload_size_mib() * BYTES_PER_MIB) as u64
	}
}

impl UploadLimit for f64 {
	fn max_upload_size_mib(&self) -> f64 {
		*self
	}
}

/// Settings consumed by the request parser.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
	/// Maximum request body size in MiB
	pub max_upload_size: f64,

	/// Debug mode: parse error messages are echoed in `400` responses
	pub debug: bool,
}

impl Default for ParserSettings {
	fn default() -> Self {
		Self {
			max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
			debug: false,
		}
	}
}

impl ParserSettings {
	/// Create settings with defaults
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the maximum upload size in MiB
	///
	/// # Examples
	///
	/// ```
	/// use sieve_conf::{ParserSettings, UploadLimit};
	///
	/// let settings = ParserSettings::new().with_max_upload_size(0.5);
	/// assert_eq!(settings.max_body_bytes(), 512 * 1024);
	/// ```
	pub fn with_max_upload_size(mut self, mib: f64) -> Self {
		self.max_upload_size = mib;
		self
	}

	/// Enable or disable debug mode
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	/// Load from `SIEVE_MAX_UPLOAD_SIZE` and `SIEVE_DEBUG`.
	pub fn from_env() -> Result<Self, SettingsError> {
		Self::from_env_with_prefix(DEFAULT_PREFIX)
	}

	/// Load from `<prefix>MAX_UPLOAD_SIZE` and `<prefix>DEBUG`, using
	/// defaults for unset variables.
	pub fn from_env_with_prefix(prefix: &str) -> Result<Self, SettingsError> {
		let env = Env::new().with_prefix(prefix);
		let settings = Self {
			max_upload_size: env.float_with_default("MAX_UPLOAD_SIZE", DEFAULT_MAX_UPLOAD_SIZE)?,
			debug: env.bool_with_default("DEBUG", false)?,
		};
		settings.validate()?;
		Ok(settings)
	}

	/// Check that the upload size is a finite, non-negative number.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if !self.max_upload_size.is_finite() || self.max_upload_size < 0.0 {
			return Err(SettingsError::InvalidMaxUploadSize(self.max_upload_size));
		}
		Ok(())
	}
}

impl UploadLimit for ParserSettings {
	fn max_upload_size_mib(&self) -> f64 {
		self.max_upload_size
	}
}

/// Settings errors
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("max upload size must be a finite, non-negative number of MiB, got {0}")]
	InvalidMaxUploadSize(f64),

	#[error(transparent)]
	Env(#[from] EnvError),
}
