use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use sieve_core::StructuredError;
use sieve_http::Data;

use crate::error::{ParseFailure, ParseResult};
use crate::parser::Parser;

/// JSON parser for `application/json` bodies.
///
/// Any JSON document is accepted as a [`Data::Json`] value tree, whatever
/// its top-level shape. A literal `null` body carries no data.
#[derive(Debug, Clone, Default)]
pub struct JSONParser;

impl JSONParser {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Parser for JSONParser {
	fn media_types(&self) -> Vec<String> {
		vec!["application/json".to_string()]
	}

	/// Any content type starting with `application/json`, parameters
	/// included.
	fn can_parse(&self, content_type: &str) -> bool {
		content_type.starts_with("application/json")
	}

	async fn parse(
		&self,
		_content_type: &str,
		body: Bytes,
		_max_bytes: u64,
	) -> ParseResult<Option<Data>> {
		let value = serde_json::from_slice::<Value>(&body)
			.map_err(|e| StructuredError::new(ParseFailure::InvalidJsonBody(e)))?;
		match value {
			Value::Null => Ok(None),
			value => Ok(Some(Data::Json(value))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ParseFailureKind;
	use rstest::rstest;
	use serde_json::json;

	async fn parse(body: &'static str) -> ParseResult<Option<Data>> {
		JSONParser::new()
			.parse("application/json", Bytes::from_static(body.as_bytes()), 1024)
			.await
	}

	#[rstest]
	#[tokio::test]
	async fn test_object_is_kept_as_value_tree() {
		// Act
		let data = parse(r#"{"a":"b","n":[1,{"x":null}]}"#).await.unwrap().unwrap();

		// Assert
		assert_eq!(data.get_str("a"), Some("b"));
		assert_eq!(data.json().unwrap()["n"], json!([1, {"x": null}]));
	}

	#[rstest]
	#[case("[1, 2]", json!([1, 2]))]
	#[case("\"text\"", json!("text"))]
	#[case("42", json!(42))]
	#[case("true", json!(true))]
	#[case(" [] ", json!([]))]
	#[tokio::test]
	async fn test_non_object_documents(#[case] body: &'static str, #[case] expected: Value) {
		let data = parse(body).await.unwrap().unwrap();

		assert_eq!(data.json(), Some(&expected));
	}

	#[rstest]
	#[tokio::test]
	async fn test_null_body_has_no_data() {
		assert!(parse("null").await.unwrap().is_none());
	}

	#[rstest]
	#[case("")]
	#[case("{\"a\":")]
	#[case("[1, 2")]
	#[case("'text'")]
	#[case("{} {}")]
	#[tokio::test]
	async fn test_invalid_bodies(#[case] body: &'static str) {
		let error = parse(body).await.unwrap_err();

		let kind = error.find::<ParseFailure>().map(ParseFailure::kind);
		assert_eq!(kind, Some(ParseFailureKind::InvalidJsonBody));
	}

	#[rstest]
	#[case("application/json", true)]
	#[case("application/json; charset=utf-8", true)]
	#[case("application/jsonp", true)]
	#[case("text/json", false)]
	#[case("Application/JSON", false)]
	fn test_can_parse(#[case] content_type: &str, #[case] expected: bool) {
		assert_eq!(JSONParser::new().can_parse(content_type), expected);
	}
}
