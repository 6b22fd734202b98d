//! # sieve-parsers
//!
//! Turns the raw query string and body of a [`Request`](sieve_http::Request)
//! into structured data.
//!
//! ## Parsers
//!
//! - **JSONParser**: `application/json` documents of any shape
//! - **MultiPartParser**: `multipart/form-data` fields and file uploads
//! - **FormParser**: `application/x-www-form-urlencoded` bodies
//!
//! [`RequestParser`] runs the whole pipeline on a request and
//! [`RequestParserMiddleware`] plugs it into a
//! [`MiddlewareChain`](sieve_http::MiddlewareChain). Failures are recorded
//! as [`ParseError`] request extensions wrapping a
//! [`StructuredError`](sieve_core::StructuredError).
//!
//! ## Example
//!
//! ```
//! use sieve_conf::ParserSettings;
//! use sieve_http::Request;
//! use sieve_parsers::{ParseOutcome, RequestParser};
//!
//! # tokio_test::block_on(async {
//! let settings = ParserSettings::default();
//! let mut request = Request::builder()
//!     .header("content-type", "application/x-www-form-urlencoded")
//!     .body("email=ann%40example.org")
//!     .build()
//!     .unwrap();
//!
//! let outcome = RequestParser::new().parse(&mut request, &settings).await;
//! assert_eq!(outcome, ParseOutcome::Continue);
//! assert_eq!(request.data.unwrap().get_str("email"), Some("ann@example.org"));
//! # });
//! ```

pub mod body;
pub mod error;
pub mod flatten;
pub mod form;
pub mod json;
pub mod middleware;
pub mod multipart;
pub mod parser;
pub mod pipeline;
pub mod query;

pub use body::{BodyOutcome, BodyParser, BoundedRead, read_bounded};
pub use error::{ParseError, ParseFailure, ParseFailureKind, ParseResult, QueryError};
pub use flatten::flatten;
pub use form::FormParser;
pub use json::JSONParser;
pub use middleware::RequestParserMiddleware;
pub use multipart::MultiPartParser;
pub use parser::Parser;
pub use pipeline::{ParseOutcome, RequestParser, parse_request};
pub use query::parse_query;
