//! Error types shared across sieve crates.

pub mod stack;
pub mod structured;

pub use stack::{CallStack, Frame, MAX_FRAMES, UNKNOWN_LOCATION};
pub use structured::{BoxError, Cause, NIL_REASON, NO_REASONS, Reason, StructuredError};

/// Result type returned by handlers and middleware.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while serving a request.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The request could not be turned into structured data
	#[error("{0}")]
	Parse(#[from] StructuredError),
	/// A handler or middleware failed
	#[error("handler error: {0}")]
	Handler(#[source] BoxError),
}

impl Error {
	/// Wrap a handler failure
	pub fn handler<E: Into<BoxError>>(err: E) -> Self {
		Error::Handler(err.into())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::error::Error as _;

	#[rstest]
	fn test_display_and_source() {
		let parse = Error::from(StructuredError::new(std::io::Error::other("bad")));
		let handler = Error::handler(std::io::Error::other("db down"));

		assert_eq!(parse.to_string(), "bad");
		assert_eq!(handler.to_string(), "handler error: db down");
		assert!(handler.source().is_some());
	}
}
