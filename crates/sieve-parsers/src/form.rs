use async_trait::async_trait;
use bytes::Bytes;
use sieve_core::StructuredError;
use sieve_http::{Data, DataValue, RequestData};

use crate::error::{ParseFailure, ParseResult};
use crate::flatten::flatten;
use crate::parser::Parser;
use crate::query;

/// Parser for `application/x-www-form-urlencoded` bodies.
///
/// Uses the same strict decoding as the query string.
#[derive(Debug, Clone, Default)]
pub struct FormParser;

impl FormParser {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Parser for FormParser {
	fn media_types(&self) -> Vec<String> {
		vec!["application/x-www-form-urlencoded".to_string()]
	}

	async fn parse(
		&self,
		content_type: &str,
		body: Bytes,
		_max_bytes: u64,
	) -> ParseResult<Option<Data>> {
		let text = String::from_utf8_lossy(&body);
		let values = query::decode(&text)
			.map_err(|e| StructuredError::new(ParseFailure::content(content_type, e)))?;
		let fields: RequestData = flatten(values)
			.into_iter()
			.map(|(key, value)| (key, DataValue::Field(value)))
			.collect();
		Ok(Some(Data::Fields(fields)))
	}
}
