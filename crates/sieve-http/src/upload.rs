//! Uploaded files
//!
//! Multipart decoding produces [`FilePart`]s. [`extract`] turns them into
//! [`UploadedFile`]s, sniffing the content type from the first
//! [`SNIFF_LEN`](sniff::SNIFF_LEN) bytes. The sniffed prefix is kept and
//! chained in front of the rest of the part, so the file stream is complete
//! whether or not the part's source can seek.

pub mod sniff;

use bytes::Bytes;
use hyper::HeaderMap;
use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::io::{self, Chain, Cursor, Read};

/// Readable stream of a file part.
pub type PartReader = Box<dyn Read + Send + Sync>;

/// Where the bytes of a file part come from.
pub trait FilePartSource: Send + Sync {
	/// Open the part's content for reading. Called once.
	fn open(self: Box<Self>) -> io::Result<PartReader>;
}

impl FilePartSource for Bytes {
	fn open(self: Box<Self>) -> io::Result<PartReader> {
		Ok(Box::new(Cursor::new(*self)))
	}
}

impl FilePartSource for Vec<u8> {
	fn open(self: Box<Self>) -> io::Result<PartReader> {
		Ok(Box::new(Cursor::new(*self)))
	}
}

/// A multipart file part before extraction.
pub struct FilePart {
	/// Multipart field name
	pub field_name: String,
	/// File name declared by the client
	pub file_name: String,
	/// Declared size in bytes
	pub size: u64,
	/// Raw part headers
	pub headers: HeaderMap,
	source: Box<dyn FilePartSource>,
}

impl FilePart {
	pub fn new(
		field_name: impl Into<String>,
		file_name: impl Into<String>,
		headers: HeaderMap,
		size: u64,
		source: impl FilePartSource + 'static,
	) -> Self {
		Self {
			field_name: field_name.into(),
			file_name: file_name.into(),
			size,
			headers,
			source: Box::new(source),
		}
	}

	/// A part held in memory; the size is the length of `content`.
	pub fn in_memory(
		field_name: impl Into<String>,
		file_name: impl Into<String>,
		headers: HeaderMap,
		content: Bytes,
	) -> Self {
		let size = content.len() as u64;
		Self::new(field_name, file_name, headers, size, content)
	}
}

impl fmt::Debug for FilePart {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FilePart")
			.field("field_name", &self.field_name)
			.field("file_name", &self.file_name)
			.field("size", &self.size)
			.finish_non_exhaustive()
	}
}

/// Errors raised while extracting uploaded files
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
	#[error("failed to open file part '{field}': {source}")]
	Open {
		field: String,
		#[source]
		source: io::Error,
	},

	#[error("failed to read file part '{field}': {source}")]
	Read {
		field: String,
		#[source]
		source: io::Error,
	},
}

/// An uploaded file with its sniffed MIME type.
///
/// The handle owns the file stream; read it with the [`Read`] impl,
/// [`read_to_bytes`](UploadedFile::read_to_bytes) or
/// [`into_reader`](UploadedFile::into_reader).
pub struct UploadedFile {
	pub file_name: String,
	pub size: u64,
	pub headers: HeaderMap,
	pub mime_type: String,
	stream: Chain<Cursor<Bytes>, PartReader>,
}

impl UploadedFile {
	/// A raw part header as text
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// Read the remaining content.
	pub fn read_to_bytes(&mut self) -> io::Result<Bytes> {
		let mut buf = Vec::new();
		self.stream.read_to_end(&mut buf)?;
		Ok(Bytes::from(buf))
	}

	/// The content stream, starting at the first byte of the file.
	pub fn into_reader(self) -> impl Read + Send + Sync {
		self.stream
	}
}

impl Read for UploadedFile {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.stream.read(buf)
	}
}

impl fmt::Debug for UploadedFile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UploadedFile")
			.field("file_name", &self.file_name)
			.field("size", &self.size)
			.field("mime_type", &self.mime_type)
			.finish_non_exhaustive()
	}
}

impl Serialize for UploadedFile {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut state = serializer.serialize_struct("UploadedFile", 3)?;
		state.serialize_field("file_name", &self.file_name)?;
		state.serialize_field("size", &self.size)?;
		state.serialize_field("mime_type", &self.mime_type)?;
		state.end()
	}
}

fn read_prefix(reader: &mut impl Read) -> io::Result<Vec<u8>> {
	let mut prefix = vec![0u8; sniff::SNIFF_LEN];
	let mut filled = 0;
	while filled < prefix.len() {
		match reader.read(&mut prefix[filled..]) {
			Ok(0) => break,
			Ok(n) => filled += n,
			Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
			Err(e) => return Err(e),
		}
	}
	prefix.truncate(filled);
	Ok(prefix)
}

/// Open one part, sniff its type and rebuild its stream.
pub fn open_part(part: FilePart) -> Result<UploadedFile, UploadError> {
	let FilePart {
		field_name,
		file_name,
		size,
		headers,
		source,
	} = part;

	let mut reader = source.open().map_err(|source| UploadError::Open {
		field: field_name.clone(),
		source,
	})?;
	let prefix = read_prefix(&mut reader).map_err(|source| UploadError::Read {
		field: field_name.clone(),
		source,
	})?;
	let mime_type = sniff::detect_content_type(&prefix).to_string();
	tracing::trace!(field = %field_name, file_name = %file_name, mime_type = %mime_type, "sniffed upload");

	Ok(UploadedFile {
		file_name,
		size,
		headers,
		mime_type,
		stream: Cursor::new(Bytes::from(prefix)).chain(reader),
	})
}

/// Extract all file parts, grouped by field name in first-seen order.
///
/// Every field maps to a list, even with a single file. Any part that
/// cannot be opened or read fails the whole extraction.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use hyper::HeaderMap;
/// use sieve_http::upload::{FilePart, extract};
///
/// let parts = vec![FilePart::in_memory("doc", "a.pdf", HeaderMap::new(), Bytes::from_static(b"%PDF-1.4"))];
/// let files = extract(parts).unwrap();
/// assert_eq!(files["doc"].len(), 1);
/// assert_eq!(files["doc"][0].mime_type, "application/pdf");
/// ```
pub fn extract(
	parts: impl IntoIterator<Item = FilePart>,
) -> Result<IndexMap<String, Vec<UploadedFile>>, UploadError> {
	let mut files: IndexMap<String, Vec<UploadedFile>> = IndexMap::new();
	for part in parts {
		let field = part.field_name.clone();
		let file = open_part(part)?;
		files.entry(field).or_default().push(file);
	}
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	const PNG: &[u8] = b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR\x00\x00\x00\x01";

	/// Hands out data a few bytes at a time, like a socket would.
	struct Trickle {
		data: Vec<u8>,
		pos: usize,
	}

	impl Read for Trickle {
		fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			let n = buf.len().min(3).min(self.data.len() - self.pos);
			buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
			self.pos += n;
			Ok(n)
		}
	}

	struct TrickleSource(Vec<u8>);

	impl FilePartSource for TrickleSource {
		fn open(self: Box<Self>) -> io::Result<PartReader> {
			Ok(Box::new(Trickle { data: self.0, pos: 0 }))
		}
	}

	struct Unopenable;

	impl FilePartSource for Unopenable {
		fn open(self: Box<Self>) -> io::Result<PartReader> {
			Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
		}
	}

	struct Broken;

	impl Read for Broken {
		fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
			Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated"))
		}
	}

	struct BrokenSource;

	impl FilePartSource for BrokenSource {
		fn open(self: Box<Self>) -> io::Result<PartReader> {
			Ok(Box::new(Broken))
		}
	}

	fn part(field: &str, name: &str, content: &'static [u8]) -> FilePart {
		FilePart::in_memory(field, name, HeaderMap::new(), Bytes::from_static(content))
	}

	#[rstest]
	fn test_sniffed_prefix_is_not_lost() {
		// Arrange
		let mut content = PNG.to_vec();
		content.extend(std::iter::repeat_n(0xAB, 2000));
		let source = TrickleSource(content.clone());
		let parts = vec![FilePart::new(
			"avatar",
			"me.png",
			HeaderMap::new(),
			content.len() as u64,
			source,
		)];

		// Act
		let mut files = extract(parts).unwrap();
		let mut file = files.swap_remove("avatar").unwrap().remove(0);

		// Assert
		assert_eq!(file.mime_type, "image/png");
		assert_eq!(file.file_name, "me.png");
		assert_eq!(file.size, content.len() as u64);
		assert_eq!(file.read_to_bytes().unwrap(), Bytes::from(content));
	}

	#[rstest]
	fn test_short_file_is_sniffed_on_available_bytes() {
		let mut files = extract(vec![part("note", "n.txt", b"hi")]).unwrap();

		let file = &mut files["note"][0];

		assert_eq!(file.mime_type, "text/plain; charset=utf-8");
		assert_eq!(file.read_to_bytes().unwrap(), Bytes::from_static(b"hi"));
	}

	#[rstest]
	fn test_files_grouped_per_field() {
		let parts = vec![
			part("docs", "a.pdf", b"%PDF-1.4"),
			part("single", "b.gif", b"GIF89a"),
			part("docs", "c.txt", b"text"),
		];

		let files = extract(parts).unwrap();

		assert_eq!(files.keys().collect::<Vec<_>>(), vec!["docs", "single"]);
		assert_eq!(files["docs"].len(), 2);
		assert_eq!(files["docs"][1].file_name, "c.txt");
		assert_eq!(files["single"].len(), 1);
		assert_eq!(files["single"][0].mime_type, "image/gif");
	}

	#[rstest]
	fn test_open_failure_discards_everything() {
		let parts = vec![
			part("ok", "a.txt", b"fine"),
			FilePart::new("bad", "b.bin", HeaderMap::new(), 0, Unopenable),
		];

		let err = extract(parts).unwrap_err();

		assert!(matches!(err, UploadError::Open { ref field, .. } if field == "bad"));
	}

	#[rstest]
	fn test_read_failure_is_reported() {
		let parts = vec![FilePart::new("bad", "b.bin", HeaderMap::new(), 10, BrokenSource)];

		let err = extract(parts).unwrap_err();

		assert!(matches!(err, UploadError::Read { .. }));
	}

	#[rstest]
	fn test_header_and_serialize() {
		let mut headers = HeaderMap::new();
		headers.insert("content-type", "image/png".parse().unwrap());
		let parts = vec![FilePart::in_memory(
			"p",
			"x.png",
			headers,
			Bytes::from_static(PNG),
		)];

		let files = extract(parts).unwrap();
		let file = &files["p"][0];

		assert_eq!(file.header("content-type"), Some("image/png"));
		assert_eq!(
			serde_json::to_value(file).unwrap(),
			serde_json::json!({"file_name": "x.png", "size": PNG.len(), "mime_type": "image/png"})
		);
	}
}
