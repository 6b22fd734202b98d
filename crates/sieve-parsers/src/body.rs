//! Bounded body reading and content-type dispatch

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use sieve_core::StructuredError;
use sieve_http::{Body, Data, Request, RequestData};
use std::io;
use std::sync::Arc;

use crate::error::{ParseFailure, ParseResult};
use crate::form::FormParser;
use crate::json::JSONParser;
use crate::multipart::MultiPartParser;
use crate::parser::Parser;

/// Result of [`read_bounded`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundedRead {
	/// The whole body, at most `max_bytes` long
	Complete(Bytes),
	/// The body is longer than `max_bytes`; `read` bytes were consumed
	TooLarge { read: u64 },
}

/// Read at most `max_bytes + 1` bytes from `body`.
///
/// Reading one byte past the limit tells an oversized body apart from one
/// that is exactly `max_bytes` long without trusting `Content-Length`.
pub async fn read_bounded(body: &mut Body, max_bytes: u64) -> io::Result<BoundedRead> {
	let ceiling = max_bytes.saturating_add(1);
	let mut buf = BytesMut::new();
	while (buf.len() as u64) < ceiling {
		let Some(chunk) = body.next().await else {
			break;
		};
		let chunk = chunk?;
		let room = ceiling - buf.len() as u64;
		let take = (chunk.len() as u64).min(room) as usize;
		buf.extend_from_slice(&chunk[..take]);
	}

	let read = buf.len() as u64;
	if read > max_bytes {
		Ok(BoundedRead::TooLarge { read })
	} else {
		Ok(BoundedRead::Complete(buf.freeze()))
	}
}

/// What [`BodyParser::parse`] did with the body.
#[derive(Debug)]
pub enum BodyOutcome {
	/// The body was read and decoded; `None` when it carries no data
	Parsed(Option<Data>),
	/// The body exceeded `limit` bytes
	TooLarge { limit: u64, read: u64 },
}

/// Selects a [`Parser`] by content type and runs it on the buffered body.
///
/// The default parsers are JSON (any `application/json...` type),
/// multipart and URL-encoded forms, tried in that order. A content type no
/// parser accepts decodes to empty data.
#[derive(Clone)]
pub struct BodyParser {
	parsers: Vec<Arc<dyn Parser>>,
}

impl Default for BodyParser {
	fn default() -> Self {
		Self {
			parsers: vec![
				Arc::new(JSONParser::new()),
				Arc::new(MultiPartParser::new()),
				Arc::new(FormParser::new()),
			],
		}
	}
}

impl BodyParser {
	pub fn new() -> Self {
		Self::default()
	}

	/// Use exactly `parsers`, in order.
	pub fn with_parsers(parsers: Vec<Arc<dyn Parser>>) -> Self {
		Self { parsers }
	}

	/// Try `parser` before the existing ones.
	pub fn prepend(mut self, parser: Arc<dyn Parser>) -> Self {
		self.parsers.insert(0, parser);
		self
	}

	/// Read the request body under `max_bytes` and decode it.
	///
	/// After a successful read the buffered bytes are put back as the
	/// request body so handlers can read the raw content again.
	pub async fn parse(
		&self,
		request: &mut Request,
		content_type: &str,
		max_bytes: u64,
	) -> ParseResult<BodyOutcome> {
		let mut body = request.take_body();
		let bytes = match read_bounded(&mut body, max_bytes).await {
			Ok(BoundedRead::Complete(bytes)) => bytes,
			Ok(BoundedRead::TooLarge { read }) => {
				return Ok(BodyOutcome::TooLarge {
					limit: max_bytes,
					read,
				});
			}
			Err(e) => return Err(StructuredError::new(ParseFailure::ErrorInRequestBody(e))),
		};
		request.set_body(bytes.clone());

		let data = self.dispatch(content_type, bytes, max_bytes).await?;
		Ok(BodyOutcome::Parsed(data))
	}

	/// Decode an already buffered body.
	pub async fn dispatch(
		&self,
		content_type: &str,
		body: Bytes,
		max_bytes: u64,
	) -> ParseResult<Option<Data>> {
		match self.parsers.iter().find(|p| p.can_parse(content_type)) {
			Some(parser) => parser.parse(content_type, body, max_bytes).await,
			None => {
				tracing::debug!(content_type, "no parser for content type");
				Ok(Some(Data::Fields(RequestData::new())))
			}
		}
	}
}

impl std::fmt::Debug for BodyParser {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let media_types: Vec<String> = self.parsers.iter().flat_map(|p| p.media_types()).collect();
		f.debug_struct("BodyParser")
			.field("media_types", &media_types)
			.finish()
	}
}
