//! Request parsing middleware

use async_trait::async_trait;
use sieve_conf::ParserSettings;
use sieve_core::exception::Result;
use sieve_http::{Handler, Middleware, Request, Response};
use std::sync::Arc;

use crate::error::ParseError;
use crate::pipeline::{ParseOutcome, RequestParser};

/// Parses query and body before the wrapped handler runs.
///
/// Requests that fail to parse never reach the handler: an oversized body
/// is answered with `413`, anything else with `400`. In debug mode the
/// `400` body carries the parse error message. The [`ParseError`] is
/// attached to the rejection response's extensions.
///
/// # Examples
///
/// ```
/// use sieve_conf::ParserSettings;
/// use sieve_http::{Handler, MiddlewareChain, Request, Response};
/// use sieve_parsers::RequestParserMiddleware;
/// use std::sync::Arc;
///
/// struct Echo;
///
/// #[async_trait::async_trait]
/// impl Handler for Echo {
///     async fn handle(&self, request: Request) -> sieve_core::exception::Result<Response> {
///         let name = request.query.get("name").and_then(|v| v.as_str()).unwrap_or("");
///         Ok(Response::ok().with_body(name.to_string()))
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let middleware = RequestParserMiddleware::new(ParserSettings::default());
/// let chain = MiddlewareChain::new(Arc::new(Echo)).with_middleware(Arc::new(middleware));
///
/// let request = Request::builder().uri("/?name=ann").build().unwrap();
/// let response = chain.handle(request).await.unwrap();
/// assert_eq!(response.body, "ann");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct RequestParserMiddleware {
	settings: Arc<ParserSettings>,
	parser: RequestParser,
}

impl RequestParserMiddleware {
	pub fn new(settings: ParserSettings) -> Self {
		Self::from_shared(Arc::new(settings))
	}

	/// Share settings with other components
	pub fn from_shared(settings: Arc<ParserSettings>) -> Self {
		Self {
			settings,
			parser: RequestParser::default(),
		}
	}

	/// Use a custom parser
	pub fn with_parser(mut self, parser: RequestParser) -> Self {
		self.parser = parser;
		self
	}

	pub fn settings(&self) -> &ParserSettings {
		&self.settings
	}

	fn reject(&self, outcome: ParseOutcome, request: &Request) -> Response {
		let mut response = match outcome {
			ParseOutcome::EntityTooLarge => Response::payload_too_large(),
			_ => Response::bad_request(),
		};
		if let Some(error) = request.extensions.get::<ParseError>() {
			if self.settings.debug {
				response = response
					.with_header("content-type", "text/plain; charset=utf-8")
					.with_body(error.to_string());
			}
			response.extensions.insert(error);
		}
		response
	}
}

impl Default for RequestParserMiddleware {
	fn default() -> Self {
		Self::new(ParserSettings::default())
	}
}

#[async_trait]
impl Middleware for RequestParserMiddleware {
	async fn process(&self, mut request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		match self.parser.parse(&mut request, self.settings.as_ref()).await {
			ParseOutcome::Continue => next.handle(request).await,
			outcome => Ok(self.reject(outcome, &request)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ParseFailureKind;
	use hyper::StatusCode;
	use rstest::rstest;

	struct Unreachable;

	#[async_trait]
	impl Handler for Unreachable {
		async fn handle(&self, _request: Request) -> Result<Response> {
			panic!("handler must not run for rejected requests");
		}
	}

	fn bad_query() -> Request {
		Request::builder().uri("/?inv;alid").build().unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_rejection_hides_message_by_default() {
		// Arrange
		let middleware = RequestParserMiddleware::default();

		// Act
		let response = middleware
			.process(bad_query(), Arc::new(Unreachable))
			.await
			.unwrap();

		// Assert
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		assert!(response.body.is_empty());
		let error = response.extensions.get::<ParseError>().unwrap();
		assert_eq!(error.kind(), Some(ParseFailureKind::InvalidQuery));
	}

	#[rstest]
	#[tokio::test]
	async fn test_debug_mode_echoes_message() {
		let middleware = RequestParserMiddleware::new(ParserSettings::new().with_debug(true));

		let response = middleware
			.process(bad_query(), Arc::new(Unreachable))
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		assert_eq!(
			response.body,
			"invalid query string: invalid semicolon separator in query"
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_too_large_is_413_without_error() {
		let middleware = RequestParserMiddleware::new(ParserSettings::new().with_max_upload_size(0.0));
		let request = Request::builder()
			.header("content-type", "text/plain")
			.body("x")
			.build()
			.unwrap();

		let response = middleware.process(request, Arc::new(Unreachable)).await.unwrap();

		assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
		assert!(!response.extensions.contains::<ParseError>());
	}
}
