//! Parse failure taxonomy

use sieve_core::exception::{BoxError, StructuredError};
use std::fmt;
use std::io;

/// Result of a parsing step. Failures are already wrapped with the stack of
/// the site that detected them.
pub type ParseResult<T> = Result<T, StructuredError>;

/// Why a request could not be parsed.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
	/// The query string is not valid URL encoding
	#[error("invalid query string: {0}")]
	InvalidQuery(#[source] QueryError),

	/// A JSON body did not decode to an object
	#[error("invalid JSON body: {0}")]
	InvalidJsonBody(#[source] serde_json::Error),

	/// A multipart or form body could not be decoded
	#[error("invalid content for type '{content_type}': {source}")]
	InvalidContentForType {
		content_type: String,
		#[source]
		source: BoxError,
	},

	/// Reading the body failed before end of stream
	#[error("error in request body: {0}")]
	ErrorInRequestBody(#[source] io::Error),
}

/// Discriminant of [`ParseFailure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseFailureKind {
	InvalidQuery,
	InvalidJsonBody,
	InvalidContentForType,
	ErrorInRequestBody,
}

impl ParseFailure {
	pub fn kind(&self) -> ParseFailureKind {
		match self {
			ParseFailure::InvalidQuery(_) => ParseFailureKind::InvalidQuery,
			ParseFailure::InvalidJsonBody(_) => ParseFailureKind::InvalidJsonBody,
			ParseFailure::InvalidContentForType { .. } => ParseFailureKind::InvalidContentForType,
			ParseFailure::ErrorInRequestBody(_) => ParseFailureKind::ErrorInRequestBody,
		}
	}

	pub(crate) fn content(content_type: &str, source: impl Into<BoxError>) -> Self {
		ParseFailure::InvalidContentForType {
			content_type: content_type.to_string(),
			source: source.into(),
		}
	}
}

impl fmt::Display for ParseFailureKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ParseFailureKind::InvalidQuery => "InvalidQuery",
			ParseFailureKind::InvalidJsonBody => "InvalidJSONBody",
			ParseFailureKind::InvalidContentForType => "InvalidContentForType",
			ParseFailureKind::ErrorInRequestBody => "ErrorInRequestBody",
		};
		f.write_str(name)
	}
}

/// Malformed URL encoding
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
	#[error("invalid semicolon separator in query")]
	Semicolon,

	#[error("invalid URL escape {0:?}")]
	InvalidEscape(String),
}

/// Request extension holding the error of a failed parse.
///
/// The parser middleware stores it on the request, and on the response it
/// returns instead of calling the handler.
#[derive(Debug, Clone)]
pub struct ParseError(pub StructuredError);

impl ParseError {
	/// The failure kind, if the error wraps a [`ParseFailure`]
	pub fn kind(&self) -> Option<ParseFailureKind> {
		self.0.find::<ParseFailure>().map(ParseFailure::kind)
	}

	pub fn error(&self) -> &StructuredError {
		&self.0
	}
}

impl fmt::Display for ParseError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_kind_survives_wrapping() {
		// Arrange
		let failure = ParseFailure::InvalidQuery(QueryError::Semicolon);

		// Act
		let error = ParseError(StructuredError::new(failure));

		// Assert
		assert_eq!(error.kind(), Some(ParseFailureKind::InvalidQuery));
		assert_eq!(
			error.to_string(),
			"invalid query string: invalid semicolon separator in query"
		);
	}

	#[rstest]
	fn test_kind_of_foreign_error() {
		let error = ParseError(StructuredError::new(io::Error::other("x")));

		assert_eq!(error.kind(), None);
	}

	#[rstest]
	#[case(ParseFailureKind::InvalidJsonBody, "InvalidJSONBody")]
	#[case(ParseFailureKind::ErrorInRequestBody, "ErrorInRequestBody")]
	fn test_kind_display(#[case] kind: ParseFailureKind, #[case] expected: &str) {
		assert_eq!(kind.to_string(), expected);
	}
}
