//! Body parser trait

use async_trait::async_trait;
use bytes::Bytes;
use sieve_core::utils::contains;
use sieve_http::Data;

use crate::error::ParseResult;

/// Lower-cased media type without parameters, e.g. `multipart/form-data`
/// for `multipart/form-data; boundary=x`.
pub fn media_type(content_type: &str) -> String {
	match content_type.parse::<mime::Mime>() {
		Ok(mime) => mime.essence_str().to_ascii_lowercase(),
		Err(_) => content_type
			.split(';')
			.next()
			.unwrap_or("")
			.trim()
			.to_ascii_lowercase(),
	}
}

/// Decodes a buffered request body.
#[async_trait]
pub trait Parser: Send + Sync {
	/// Media types this parser handles
	fn media_types(&self) -> Vec<String>;

	/// Whether this parser handles `content_type`. Matches the media type
	/// against [`media_types`](Parser::media_types) by default.
	fn can_parse(&self, content_type: &str) -> bool {
		contains(&self.media_types(), &media_type(content_type))
	}

	/// Decode `body`. `Ok(None)` means the body carries no data.
	///
	/// `max_bytes` is the configured body limit; the buffered body never
	/// exceeds it.
	async fn parse(
		&self,
		content_type: &str,
		body: Bytes,
		max_bytes: u64,
	) -> ParseResult<Option<Data>>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("application/x-www-form-urlencoded", "application/x-www-form-urlencoded")]
	#[case("Multipart/Form-Data; boundary=abc", "multipart/form-data")]
	#[case("text/plain;charset=utf-8", "text/plain")]
	#[case("not a mime; x=1", "not a mime")]
	fn test_media_type(#[case] content_type: &str, #[case] expected: &str) {
		assert_eq!(media_type(content_type), expected);
	}
}
