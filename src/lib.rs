//! # sieve
//!
//! Request ingestion for async Rust web services: query and body parsing,
//! file uploads with content sniffing, content negotiation and structured
//! parse errors.
//!
//! ## Feature Flags
//!
//! - `parsers` - the parsing pipeline and [`RequestParserMiddleware`](parsers::RequestParserMiddleware)
//! - `conf` - settings loaded from the environment
//! - `full` (default) - everything
//!
//! ## Quick Example
//!
//! ```
//! use sieve::prelude::*;
//! use std::sync::Arc;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//!     async fn handle(&self, request: Request) -> Result<Response> {
//!         let email = request
//!             .data
//!             .as_ref()
//!             .and_then(|data| data.get_str("email"))
//!             .unwrap_or("nobody");
//!         Ok(Response::ok().with_body(format!("hello {}", email)))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let chain = MiddlewareChain::new(Arc::new(Hello))
//!     .with_middleware(Arc::new(RequestParserMiddleware::new(ParserSettings::default())));
//!
//! let request = Request::builder()
//!     .header("content-type", "application/json")
//!     .body(r#"{"email": "ann@example.org"}"#)
//!     .build()
//!     .unwrap();
//!
//! let response = chain.handle(request).await.unwrap();
//! assert_eq!(response.body, "hello ann@example.org");
//! # });
//! ```

pub use sieve_core as core;
pub use sieve_http as http;

#[cfg(feature = "conf")]
pub use sieve_conf as conf;

#[cfg(feature = "parsers")]
pub use sieve_parsers as parsers;

pub use sieve_core::exception::{Error, Result, StructuredError};
pub use sieve_core::negotiation::{HeaderValue, best_match, parse_header};
pub use sieve_http::{
	Body, Data, DataValue, Extensions, Handler, Middleware, MiddlewareChain, ParsedValue, QueryMap,
	Request, RequestData, Response, UploadedFile,
};

#[cfg(feature = "conf")]
pub use sieve_conf::{ParserSettings, UploadLimit};

#[cfg(feature = "parsers")]
pub use sieve_parsers::{
	ParseError, ParseFailure, ParseFailureKind, ParseOutcome, RequestParser,
	RequestParserMiddleware, parse_request,
};

/// Commonly used types
pub mod prelude {
	pub use crate::{
		Body, Data, DataValue, Error, Extensions, Handler, HeaderValue, Middleware, MiddlewareChain,
		ParsedValue, QueryMap, Request, RequestData, Response, Result, StructuredError,
		UploadedFile,
	};

	// External
	pub use async_trait::async_trait;

	#[cfg(feature = "conf")]
	pub use crate::{ParserSettings, UploadLimit};

	#[cfg(feature = "parsers")]
	pub use crate::{
		ParseError, ParseFailureKind, ParseOutcome, RequestParser, RequestParserMiddleware,
	};
}
