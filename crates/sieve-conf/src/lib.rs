//! # sieve-conf
//!
//! Settings for the sieve request pipeline. The only value the parser needs
//! is the maximum request body size, expressed in MiB; it is exposed through
//! the [`UploadLimit`] trait so any configuration source can provide it.
//!
//! ```
//! use sieve_conf::{ParserSettings, UploadLimit};
//!
//! let settings = ParserSettings::default();
//! assert_eq!(settings.max_body_bytes(), 10 * 1024 * 1024);
//! ```

pub mod env;
pub mod settings;

pub use env::{Env, EnvError};
pub use settings::{DEFAULT_MAX_UPLOAD_SIZE, ParserSettings, SettingsError, UploadLimit};
