//! Tests of the `sieve` facade crate: everything reachable through the
//! prelude and the top-level re-exports.

use bytes::Bytes;
use hyper::StatusCode;
use rstest::rstest;
use serial_test::serial;
use sieve::prelude::*;
use sieve::{best_match, parse_header, parse_request};
use std::sync::Arc;

const OFFERED: [&str; 2] = ["application/json", "text/html"];

struct Negotiate;

#[async_trait]
impl Handler for Negotiate {
	async fn handle(&self, request: Request) -> Result<Response> {
		let accept = request.header("accept").unwrap_or("*/*");
		let chosen = best_match(accept, &OFFERED).unwrap_or("none");
		Ok(Response::ok().with_body(chosen.to_string()))
	}
}

#[rstest]
#[case("text/html;q=0.9, application/json;q=0.4", "text/html")]
#[case("application/*", "application/json")]
#[case("image/webp", "none")]
#[tokio::test]
async fn test_negotiation_behind_parser(#[case] accept: &str, #[case] expected: &str) {
	// Arrange
	let chain = MiddlewareChain::new(Arc::new(Negotiate))
		.with_middleware(Arc::new(RequestParserMiddleware::default()));
	let request = Request::builder()
		.uri("/?page=2")
		.header("accept", accept)
		.build()
		.unwrap();

	// Act
	let response = chain.handle(request).await.unwrap();

	// Assert
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(response.body, Bytes::from(expected.to_string()));
}

#[rstest]
fn test_parse_header_is_reexported() {
	let values = parse_header("en-US, en;q=0.8, *;q=0.1");

	let order: Vec<&str> = values.iter().map(|v| v.value.as_str()).collect();
	assert_eq!(order, ["en-US", "en", "*"]);
}

#[rstest]
#[tokio::test]
async fn test_parse_request_with_settings() {
	// Arrange
	let settings = ParserSettings::new().with_max_upload_size(1.0);
	let mut request = Request::builder()
		.uri("/?tag=a&tag=b")
		.header("content-type", "application/x-www-form-urlencoded")
		.body("name=ann+lee&city=Paris")
		.build()
		.unwrap();

	// Act
	let outcome = parse_request(&mut request, &settings).await;

	// Assert
	assert_eq!(outcome, ParseOutcome::Continue);
	assert_eq!(request.query["tag"].values(), vec!["a", "b"]);
	let data = request.data.unwrap();
	assert_eq!(data.get_str("name"), Some("ann lee"));
	assert_eq!(data.get_str("city"), Some("Paris"));
}

#[rstest]
#[tokio::test]
async fn test_json_array_reaches_handler() {
	let mut request = Request::builder()
		.header("content-type", "application/json")
		.body("[1, 2]")
		.build()
		.unwrap();

	let outcome = parse_request(&mut request, &ParserSettings::default()).await;

	assert_eq!(outcome, ParseOutcome::Continue);
	let data = request.data.unwrap();
	assert_eq!(data.json().and_then(|v| v.as_array()).map(Vec::len), Some(2));
}

#[rstest]
#[tokio::test]
async fn test_parse_error_is_visible_to_caller() {
	let mut request = Request::builder()
		.header("content-type", "application/json")
		.body("[1, 2")
		.build()
		.unwrap();

	let outcome = parse_request(&mut request, &ParserSettings::default()).await;

	assert_eq!(outcome, ParseOutcome::BadRequest);
	let error = request.extensions.get::<ParseError>().unwrap();
	assert_eq!(error.kind(), Some(ParseFailureKind::InvalidJsonBody));
	assert!(!error.error().report().is_empty());
}

#[rstest]
#[serial(env)]
fn test_settings_from_environment() {
	// SAFETY: tests touching the environment are serialized
	unsafe { std::env::set_var("SIEVEFACADE_MAX_UPLOAD_SIZE", "2") };

	let settings = ParserSettings::from_env_with_prefix("SIEVEFACADE_").unwrap();

	assert_eq!(settings.max_body_bytes(), 2 * 1024 * 1024);

	// SAFETY: see above
	unsafe { std::env::remove_var("SIEVEFACADE_MAX_UPLOAD_SIZE") };
}
