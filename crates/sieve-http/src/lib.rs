//! # sieve-http
//!
//! HTTP types for the sieve request pipeline.
//!
//! - [`Request`] carries the streamed [`Body`] together with the parsed
//!   [`QueryMap`] and [`Data`] slots filled by `sieve-parsers`.
//! - [`Response`] is the minimal response used by handlers and middleware.
//! - [`Handler`], [`Middleware`] and [`MiddlewareChain`] compose request
//!   processing.
//! - [`upload`] turns multipart file parts into [`UploadedFile`] handles
//!   with a sniffed MIME type.

pub mod body;
pub mod data;
pub mod extensions;
pub mod middleware;
pub mod request;
pub mod response;
pub mod upload;

pub use body::Body;
pub use data::{Data, DataValue, ParsedValue, QueryMap, RequestData};
pub use extensions::Extensions;
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use request::{Request, RequestBuildError, RequestBuilder};
pub use response::Response;
pub use upload::{FilePart, FilePartSource, UploadError, UploadedFile};

pub use sieve_core::exception::{Error, Result};
