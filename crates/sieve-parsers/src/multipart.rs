use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::ready;
use futures_util::stream::once;
use multer::{Constraints, Multipart, SizeLimit};
use sieve_core::StructuredError;
use sieve_http::upload::{self, FilePart};
use sieve_http::{Data, DataValue, RequestData};

use crate::error::{ParseFailure, ParseResult};
use crate::flatten::{MultiMap, flatten};
use crate::parser::Parser;

/// Parser for `multipart/form-data` bodies.
///
/// Text fields are flattened like form fields. Parts that declare a file
/// name become [`UploadedFile`](sieve_http::UploadedFile)s with a sniffed
/// MIME type, always stored as a list per field. Parts without a name are
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct MultiPartParser;

impl MultiPartParser {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Parser for MultiPartParser {
	fn media_types(&self) -> Vec<String> {
		vec!["multipart/form-data".to_string()]
	}

	async fn parse(
		&self,
		content_type: &str,
		body: Bytes,
		max_bytes: u64,
	) -> ParseResult<Option<Data>> {
		let fail = |e: multer::Error| StructuredError::new(ParseFailure::content(content_type, e));

		let boundary = multer::parse_boundary(content_type).map_err(fail)?;
		let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(max_bytes));
		let stream = once(ready(Ok::<_, std::io::Error>(body)));
		let mut multipart = Multipart::with_constraints(stream, boundary, constraints);

		let mut fields = MultiMap::new();
		let mut parts = Vec::new();
		while let Some(field) = multipart.next_field().await.map_err(fail)? {
			let Some(name) = field.name().filter(|n| !n.is_empty()).map(str::to_owned) else {
				tracing::debug!("skipping multipart part without a name");
				continue;
			};
			let file_name = field
				.file_name()
				.filter(|n| !n.is_empty())
				.map(str::to_owned);
			let headers = field.headers().clone();
			let content = field.bytes().await.map_err(fail)?;

			match file_name {
				Some(file_name) => parts.push(FilePart::in_memory(name, file_name, headers, content)),
				None => fields
					.entry(name)
					.or_default()
					.push(String::from_utf8_lossy(&content).into_owned()),
			}
		}

		let files = upload::extract(parts)
			.map_err(|e| StructuredError::new(ParseFailure::content(content_type, e)))?;

		let mut data: RequestData = flatten(fields)
			.into_iter()
			.map(|(key, value)| (key, DataValue::Field(value)))
			.collect();
		for (key, files) in files {
			data.insert(key, DataValue::Files(files));
		}
		Ok(Some(Data::Fields(data)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ParseFailureKind;
	use rstest::rstest;

	const CONTENT_TYPE: &str = "multipart/form-data; boundary=XBOUNDARY";

	fn body(parts: &[(&str, Option<&str>, &str)]) -> Bytes {
		let mut out = Vec::new();
		for (name, file_name, content) in parts {
			out.extend_from_slice(b"--XBOUNDARY\r\n");
			let disposition = match file_name {
				Some(file_name) => format!(
					"Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
					name, file_name
				),
				None => format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name),
			};
			out.extend_from_slice(disposition.as_bytes());
			out.extend_from_slice(content.as_bytes());
			out.extend_from_slice(b"\r\n");
		}
		out.extend_from_slice(b"--XBOUNDARY--\r\n");
		Bytes::from(out)
	}

	async fn parse_fields(body: Bytes) -> RequestData {
		MultiPartParser::new()
			.parse(CONTENT_TYPE, body, 1 << 20)
			.await
			.unwrap()
			.and_then(Data::into_fields)
			.unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_fields_and_files() {
		// Arrange
		let body = body(&[
			("email", None, "johndoe@example.org"),
			("tag", None, "a"),
			("tag", None, "b"),
			("doc", Some("a.pdf"), "%PDF-1.4 ..."),
		]);

		// Act
		let data = parse_fields(body).await;

		// Assert
		assert_eq!(data["email"].as_str(), Some("johndoe@example.org"));
		assert_eq!(data["tag"].as_field().unwrap().values(), vec!["a", "b"]);
		let files = data["doc"].as_files().unwrap();
		assert_eq!(files.len(), 1);
		assert_eq!(files[0].file_name, "a.pdf");
		assert_eq!(files[0].mime_type, "application/pdf");
		assert_eq!(files[0].header("content-type"), Some("application/octet-stream"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_empty_file_name_is_a_field() {
		let body = body(&[("note", Some(""), "plain")]);

		let data = parse_fields(body).await;

		assert_eq!(data["note"].as_str(), Some("plain"));
	}

	#[rstest]
	#[case("multipart/form-data")]
	#[case(CONTENT_TYPE)]
	#[tokio::test]
	async fn test_malformed_multipart(#[case] content_type: &str) {
		let error = MultiPartParser::new()
			.parse(content_type, Bytes::from_static(b"garbage"), 1 << 20)
			.await
			.unwrap_err();

		let kind = error.find::<ParseFailure>().map(ParseFailure::kind);
		assert_eq!(kind, Some(ParseFailureKind::InvalidContentForType));
	}
}
