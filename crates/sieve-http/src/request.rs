//! HTTP request representation

use hyper::header::{CONTENT_TYPE, HeaderName, HeaderValue as RawHeaderValue};
use hyper::{HeaderMap, Method, Uri, Version};
use sieve_core::negotiation::{HeaderValue, parse_header};

use crate::body::Body;
use crate::data::{Data, QueryMap};
use crate::extensions::Extensions;

/// An incoming request moving through the handler chain.
///
/// `query` and `data` start out empty; the request parser fills them in
/// before handlers run.
#[derive(Debug)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	body: Body,
	/// Decoded query string. Empty when the query is missing or malformed.
	pub query: QueryMap,
	/// Decoded body, `None` until a body has been parsed successfully.
	pub data: Option<Data>,
	pub extensions: Extensions,
}

impl Request {
	/// Start building a request
	///
	/// # Examples
	///
	/// ```
	/// use sieve_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/users?page=2")
	///     .header("content-type", "application/json")
	///     .body(r#"{"name":"ann"}"#)
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.query_string(), "page=2");
	/// assert_eq!(request.content_type(), Some("application/json"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Path component of the URI
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Raw (still percent-encoded) query string, empty when absent
	pub fn query_string(&self) -> &str {
		self.uri.query().unwrap_or("")
	}

	/// The `Content-Type` header, if present and valid text
	pub fn content_type(&self) -> Option<&str> {
		self.header(CONTENT_TYPE.as_str())
	}

	/// A header value as text
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// A weighted header (`Accept`, `Accept-Language`, ...) in preference
	/// order. Missing headers yield an empty list.
	///
	/// # Examples
	///
	/// ```
	/// use sieve_http::Request;
	///
	/// let request = Request::builder()
	///     .header("accept-language", "en;q=0.5, fr")
	///     .build()
	///     .unwrap();
	///
	/// let languages = request.header_values("accept-language");
	/// assert_eq!(languages[0].value, "fr");
	/// ```
	pub fn header_values(&self, name: &str) -> Vec<HeaderValue> {
		self.header(name).map(parse_header).unwrap_or_default()
	}

	pub fn body(&self) -> &Body {
		&self.body
	}

	pub fn body_mut(&mut self) -> &mut Body {
		&mut self.body
	}

	/// Take the body, leaving an empty one in its place
	pub fn take_body(&mut self) -> Body {
		std::mem::take(&mut self.body)
	}

	/// Replace the body
	pub fn set_body(&mut self, body: impl Into<Body>) {
		self.body = body.into();
	}

	/// Convert a hyper request, keeping the body streamed
	pub fn from_hyper(request: hyper::Request<hyper::body::Incoming>) -> Self {
		let (parts, body) = request.into_parts();
		Self {
			method: parts.method,
			uri: parts.uri,
			version: parts.version,
			headers: parts.headers,
			body: Body::from(body),
			query: QueryMap::new(),
			data: None,
			extensions: Extensions::new(),
		}
	}
}

impl From<hyper::Request<hyper::body::Incoming>> for Request {
	fn from(request: hyper::Request<hyper::body::Incoming>) -> Self {
		Self::from_hyper(request)
	}
}

/// Errors raised by [`RequestBuilder::build`]
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RequestBuildError {
	#[error("invalid uri: {0}")]
	InvalidUri(#[from] http::uri::InvalidUri),

	#[error("invalid header name: {0}")]
	InvalidHeaderName(String),

	#[error("invalid value for header '{0}'")]
	InvalidHeaderValue(String),
}

/// Builder for [`Request`]
///
/// Errors are deferred until [`build`](RequestBuilder::build).
#[derive(Debug)]
pub struct RequestBuilder {
	method: Method,
	uri: Option<String>,
	version: Version,
	headers: HeaderMap,
	body: Body,
	data: Option<Data>,
	error: Option<RequestBuildError>,
}

impl Default for RequestBuilder {
	fn default() -> Self {
		Self {
			method: Method::GET,
			uri: None,
			version: Version::HTTP_11,
			headers: HeaderMap::new(),
			body: Body::empty(),
			data: None,
			error: None,
		}
	}
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = version;
		self
	}

	/// Replace all headers
	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Append one header
	pub fn header(mut self, name: &str, value: &str) -> Self {
		if self.error.is_some() {
			return self;
		}
		let name = match HeaderName::from_bytes(name.as_bytes()) {
			Ok(name) => name,
			Err(_) => {
				self.error = Some(RequestBuildError::InvalidHeaderName(name.to_string()));
				return self;
			}
		};
		match RawHeaderValue::from_str(value) {
			Ok(value) => {
				self.headers.append(name, value);
			}
			Err(_) => {
				self.error = Some(RequestBuildError::InvalidHeaderValue(name.to_string()));
			}
		}
		self
	}

	pub fn body(mut self, body: impl Into<Body>) -> Self {
		self.body = body.into();
		self
	}

	/// Pre-populate the parsed body; the request parser will leave it alone.
	pub fn data(mut self, data: impl Into<Data>) -> Self {
		self.data = Some(data.into());
		self
	}

	pub fn build(self) -> Result<Request, RequestBuildError> {
		if let Some(error) = self.error {
			return Err(error);
		}
		let uri = match self.uri {
			Some(uri) => uri.parse::<Uri>()?,
			None => Uri::from_static("/"),
		};
		Ok(Request {
			method: self.method,
			uri,
			version: self.version,
			headers: self.headers,
			body: self.body,
			query: QueryMap::new(),
			data: self.data,
			extensions: Extensions::new(),
		})
	}
}
