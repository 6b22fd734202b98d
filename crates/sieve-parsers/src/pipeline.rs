//! Per-request parsing
//!
//! Runs once per request, before the handler:
//!
//! 1. The query string is decoded into [`Request::query`]. A malformed
//!    query leaves an empty map and rejects the request.
//! 2. Unless [`Request::data`] is already set, the body is read under the
//!    configured limit and decoded into it according to `Content-Type`.
//!    Requests without a `Content-Type`, or with an empty one, carry no
//!    data.
//!
//! Failures are stored as a [`ParseError`] request extension and logged.

use hyper::StatusCode;
use sieve_conf::UploadLimit;
use sieve_core::StructuredError;
use sieve_http::{QueryMap, Request};

use crate::body::{BodyOutcome, BodyParser};
use crate::error::ParseError;
use crate::query::try_parse_query;

/// How request processing should go on after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
	/// Hand the request to the next handler
	Continue,
	/// Reject with `413 Payload Too Large`
	EntityTooLarge,
	/// Reject with `400 Bad Request`
	BadRequest,
}

impl ParseOutcome {
	pub fn is_continue(self) -> bool {
		self == ParseOutcome::Continue
	}

	/// Status of the rejection response, `None` for [`ParseOutcome::Continue`]
	pub fn status(self) -> Option<StatusCode> {
		match self {
			ParseOutcome::Continue => None,
			ParseOutcome::EntityTooLarge => Some(StatusCode::PAYLOAD_TOO_LARGE),
			ParseOutcome::BadRequest => Some(StatusCode::BAD_REQUEST),
		}
	}
}

/// Parses query and body of requests.
#[derive(Debug, Clone, Default)]
pub struct RequestParser {
	body: BodyParser,
}

impl RequestParser {
	pub fn new() -> Self {
		Self::default()
	}

	/// Use a custom body parser set
	pub fn with_body_parser(mut self, body: BodyParser) -> Self {
		self.body = body;
		self
	}

	/// Parse `request` in place.
	pub async fn parse<L>(&self, request: &mut Request, limit: &L) -> ParseOutcome
	where
		L: UploadLimit + ?Sized,
	{
		match try_parse_query(request.query_string()) {
			Ok(query) => request.query = query,
			Err(error) => {
				request.query = QueryMap::new();
				record(request, error);
				return ParseOutcome::BadRequest;
			}
		}

		if request.data.is_some() {
			tracing::debug!(path = request.path(), "request data already set, skipping body");
			return ParseOutcome::Continue;
		}
		let Some(content_type) = request
			.content_type()
			.filter(|ct| !ct.trim().is_empty())
			.map(str::to_owned)
		else {
			tracing::debug!(path = request.path(), "no content type, skipping body");
			return ParseOutcome::Continue;
		};

		let max_bytes = limit.max_body_bytes();
		match self.body.parse(request, &content_type, max_bytes).await {
			Ok(BodyOutcome::Parsed(data)) => {
				request.data = data;
				ParseOutcome::Continue
			}
			Ok(BodyOutcome::TooLarge { limit, read }) => {
				tracing::debug!(limit, read, "request body too large");
				ParseOutcome::EntityTooLarge
			}
			Err(error) => {
				record(request, error);
				ParseOutcome::BadRequest
			}
		}
	}
}

fn record(request: &Request, error: StructuredError) {
	let error = ParseError(error);
	tracing::warn!(
		kind = ?error.kind(),
		frames = error.error().stack().len(),
		error = %error,
		"failed to parse request"
	);
	// Symbol resolution is only paid for when debug output is wanted.
	tracing::debug!(origin = %error.error().file_line(), "parse failure origin");
	request.extensions.insert(error);
}

/// Parse `request` with the default parsers.
///
/// # Examples
///
/// ```
/// use sieve_http::Request;
/// use sieve_parsers::{ParseOutcome, parse_request};
///
/// # tokio_test::block_on(async {
/// let mut request = Request::builder()
///     .uri("/?a=b&array=1&array=2")
///     .header("content-type", "application/json")
///     .body(r#"{"a":"b"}"#)
///     .build()
///     .unwrap();
///
/// let outcome = parse_request(&mut request, &10.0).await;
///
/// assert_eq!(outcome, ParseOutcome::Continue);
/// assert_eq!(request.query["array"].values(), vec!["1", "2"]);
/// assert_eq!(request.data.unwrap().get_str("a"), Some("b"));
/// # });
/// ```
pub async fn parse_request<L>(request: &mut Request, limit: &L) -> ParseOutcome
where
	L: UploadLimit + ?Sized,
{
	RequestParser::default().parse(request, limit).await
}
