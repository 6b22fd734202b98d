//! Strict URL-encoded decoding
//!
//! Used for the query string and for `application/x-www-form-urlencoded`
//! bodies. Pairs are separated by `&`; a `;` anywhere in a pair and a `%`
//! not followed by two hex digits are errors. `+` decodes to a space.

use percent_encoding::percent_decode_str;
use sieve_core::StructuredError;
use sieve_http::QueryMap;
use std::borrow::Cow;

use crate::error::{ParseFailure, ParseResult, QueryError};
use crate::flatten::{MultiMap, flatten};

fn check_escapes(s: &str) -> Result<(), QueryError> {
	let bytes = s.as_bytes();
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'%' {
			let valid = bytes.len() >= i + 3
				&& bytes[i + 1].is_ascii_hexdigit()
				&& bytes[i + 2].is_ascii_hexdigit();
			if !valid {
				let end = (i + 3).min(bytes.len());
				return Err(QueryError::InvalidEscape(
					String::from_utf8_lossy(&bytes[i..end]).into_owned(),
				));
			}
			i += 3;
		} else {
			i += 1;
		}
	}
	Ok(())
}

fn unescape(s: &str) -> Result<String, QueryError> {
	check_escapes(s)?;
	let spaced: Cow<'_, str> = if s.contains('+') {
		Cow::Owned(s.replace('+', " "))
	} else {
		Cow::Borrowed(s)
	};
	Ok(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
}

/// Decode `raw` into values grouped by key.
///
/// Empty pairs (`a=1&&b=2`) are skipped; a pair without `=` has an empty
/// value.
pub fn decode(raw: &str) -> Result<MultiMap, QueryError> {
	let mut values = MultiMap::new();
	for pair in raw.split('&') {
		if pair.contains(';') {
			return Err(QueryError::Semicolon);
		}
		if pair.is_empty() {
			continue;
		}
		let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
		values
			.entry(unescape(key)?)
			.or_default()
			.push(unescape(value)?);
	}
	Ok(values)
}

/// Parse a raw query string.
///
/// On failure the map is still returned, empty, together with the error.
///
/// # Examples
///
/// ```
/// use sieve_http::ParsedValue;
/// use sieve_parsers::query::parse_query;
///
/// let (query, error) = parse_query("a=b&array=1&array=2");
/// assert!(error.is_none());
/// assert_eq!(query["a"], ParsedValue::Single("b".into()));
/// assert_eq!(query["array"].values(), vec!["1", "2"]);
///
/// let (query, error) = parse_query("inv;alid");
/// assert!(query.is_empty());
/// assert!(error.is_some());
/// ```
pub fn parse_query(raw: &str) -> (QueryMap, Option<StructuredError>) {
	match try_parse_query(raw) {
		Ok(query) => (query, None),
		Err(error) => (QueryMap::new(), Some(error)),
	}
}

/// Parse a raw query string, failing with [`ParseFailure::InvalidQuery`].
pub fn try_parse_query(raw: &str) -> ParseResult<QueryMap> {
	let values =
		decode(raw).map_err(|e| StructuredError::new(ParseFailure::InvalidQuery(e)))?;
	Ok(flatten(values))
}
