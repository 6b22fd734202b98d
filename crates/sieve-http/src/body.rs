//! Streamed request body

use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use http_body_util::BodyExt;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A request body.
///
/// Either fully buffered or a boxed stream of chunks. Reading happens
/// through the [`Stream`] implementation; the body is consumed as it is
/// read, so a reader that needs the bytes afterwards must put them back with
/// [`Request::set_body`](crate::Request::set_body).
pub struct Body {
	kind: Kind,
}

enum Kind {
	Empty,
	Full(Bytes),
	Stream(BoxStream<'static, io::Result<Bytes>>),
}

impl Body {
	/// An empty body
	pub fn empty() -> Self {
		Self { kind: Kind::Empty }
	}

	/// Wrap a stream of chunks.
	///
	/// # Examples
	///
	/// ```
	/// use bytes::Bytes;
	/// use futures::stream;
	/// use sieve_http::Body;
	///
	/// let chunks = vec![Ok(Bytes::from("a=")), Ok(Bytes::from("b"))];
	/// let body = Body::from_stream(stream::iter(chunks));
	/// assert!(body.as_bytes().is_none());
	/// ```
	pub fn from_stream<S>(stream: S) -> Self
	where
		S: Stream<Item = io::Result<Bytes>> + Send + 'static,
	{
		Self {
			kind: Kind::Stream(stream.boxed()),
		}
	}

	/// Adapt any `http_body::Body` (for instance `hyper::body::Incoming`).
	///
	/// Transport errors are surfaced as [`io::Error`]s.
	pub fn from_http_body<B>(body: B) -> Self
	where
		B: hyper::body::Body<Data = Bytes> + Send + Unpin + 'static,
		B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
	{
		Self::from_stream(body.into_data_stream().map_err(io::Error::other))
	}

	/// The buffered bytes, if this body is not a stream.
	pub fn as_bytes(&self) -> Option<&Bytes> {
		match &self.kind {
			Kind::Full(bytes) => Some(bytes),
			_ => None,
		}
	}

	/// Whether the body is known to hold no bytes.
	pub fn is_empty(&self) -> bool {
		match &self.kind {
			Kind::Empty => true,
			Kind::Full(bytes) => bytes.is_empty(),
			Kind::Stream(_) => false,
		}
	}

	/// Read the whole body into memory.
	///
	/// This is unbounded; the request parser uses its own bounded read.
	pub async fn to_bytes(self) -> io::Result<Bytes> {
		let mut stream = self;
		if let Some(bytes) = stream.as_bytes() {
			return Ok(bytes.clone());
		}
		let mut buf = Vec::new();
		while let Some(chunk) = stream.next().await {
			buf.extend_from_slice(&chunk?);
		}
		Ok(Bytes::from(buf))
	}
}

impl Default for Body {
	fn default() -> Self {
		Self::empty()
	}
}

impl fmt::Debug for Body {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.kind {
			Kind::Empty => f.write_str("Body::Empty"),
			Kind::Full(bytes) => f.debug_tuple("Body::Full").field(&bytes.len()).finish(),
			Kind::Stream(_) => f.write_str("Body::Stream"),
		}
	}
}

impl Stream for Body {
	type Item = io::Result<Bytes>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		let this = self.get_mut();
		match std::mem::replace(&mut this.kind, Kind::Empty) {
			Kind::Empty => Poll::Ready(None),
			Kind::Full(bytes) if bytes.is_empty() => Poll::Ready(None),
			Kind::Full(bytes) => Poll::Ready(Some(Ok(bytes))),
			Kind::Stream(mut stream) => {
				let poll = stream.as_mut().poll_next(cx);
				if !matches!(poll, Poll::Ready(None)) {
					this.kind = Kind::Stream(stream);
				}
				poll
			}
		}
	}
}

impl From<Bytes> for Body {
	fn from(bytes: Bytes) -> Self {
		Self {
			kind: Kind::Full(bytes),
		}
	}
}

impl From<Vec<u8>> for Body {
	fn from(bytes: Vec<u8>) -> Self {
		Bytes::from(bytes).into()
	}
}

impl From<&'static [u8]> for Body {
	fn from(bytes: &'static [u8]) -> Self {
		Bytes::from_static(bytes).into()
	}
}

impl From<&'static str> for Body {
	fn from(text: &'static str) -> Self {
		Bytes::from_static(text.as_bytes()).into()
	}
}

impl From<String> for Body {
	fn from(text: String) -> Self {
		Bytes::from(text).into()
	}
}

impl From<hyper::body::Incoming> for Body {
	fn from(incoming: hyper::body::Incoming) -> Self {
		Self::from_http_body(incoming)
	}
}
