//! Content-type sniffing
//!
//! Implements the WHATWG MIME sniffing table for the leading bytes of a
//! file: markup tags, document and image magic numbers, audio/video
//! containers, fonts and archives, then a text/binary fallback.

/// Number of leading bytes inspected.
pub const SNIFF_LEN: usize = 512;

/// Fallback for content with binary bytes and no known signature.
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_UTF8: &str = "text/plain; charset=utf-8";

enum Sig {
	/// Case-insensitive HTML tag, after leading whitespace, followed by a
	/// space or `>`
	Html(&'static [u8]),
	/// `data & mask == pattern`, optionally after leading whitespace
	Masked {
		mask: &'static [u8],
		pattern: &'static [u8],
		skip_ws: bool,
		content_type: &'static str,
	},
	Exact(&'static [u8], &'static str),
	Mp4,
	Text,
}

const fn exact(prefix: &'static [u8], content_type: &'static str) -> Sig {
	Sig::Exact(prefix, content_type)
}

const fn riff(kind: &'static [u8; 12], content_type: &'static str) -> Sig {
	Sig::Masked {
		mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
		pattern: kind,
		skip_ws: false,
		content_type,
	}
}

static SIGNATURES: &[Sig] = &[
	Sig::Html(b"<!DOCTYPE HTML"),
	Sig::Html(b"<HTML"),
	Sig::Html(b"<HEAD"),
	Sig::Html(b"<SCRIPT"),
	Sig::Html(b"<IFRAME"),
	Sig::Html(b"<H1"),
	Sig::Html(b"<DIV"),
	Sig::Html(b"<FONT"),
	Sig::Html(b"<TABLE"),
	Sig::Html(b"<A"),
	Sig::Html(b"<STYLE"),
	Sig::Html(b"<TITLE"),
	Sig::Html(b"<B"),
	Sig::Html(b"<BODY"),
	Sig::Html(b"<BR"),
	Sig::Html(b"<P"),
	Sig::Html(b"<!--"),
	Sig::Masked {
		mask: b"\xFF\xFF\xFF\xFF\xFF",
		pattern: b"<?xml",
		skip_ws: true,
		content_type: "text/xml; charset=utf-8",
	},
	exact(b"%PDF-", "application/pdf"),
	exact(b"%!PS-Adobe-", "application/postscript"),
	// Byte order marks
	exact(b"\xFE\xFF", "text/plain; charset=utf-16be"),
	exact(b"\xFF\xFE", "text/plain; charset=utf-16le"),
	exact(b"\xEF\xBB\xBF", TEXT_UTF8),
	// Images
	exact(b"\x00\x00\x01\x00", "image/x-icon"),
	exact(b"\x00\x00\x02\x00", "image/x-icon"),
	exact(b"BM", "image/bmp"),
	exact(b"GIF87a", "image/gif"),
	exact(b"GIF89a", "image/gif"),
	Sig::Masked {
		mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
		pattern: b"RIFF\x00\x00\x00\x00WEBPVP",
		skip_ws: false,
		content_type: "image/webp",
	},
	exact(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
	exact(b"\xFF\xD8\xFF", "image/jpeg"),
	// Audio and video
	Sig::Masked {
		mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
		pattern: b"FORM\x00\x00\x00\x00AIFF",
		skip_ws: false,
		content_type: "audio/aiff",
	},
	exact(b"ID3", "audio/mpeg"),
	exact(b"OggS\x00", "application/ogg"),
	exact(b"MThd\x00\x00\x00\x06", "audio/midi"),
	riff(b"RIFF\x00\x00\x00\x00AVI ", "video/avi"),
	riff(b"RIFF\x00\x00\x00\x00WAVE", "audio/wave"),
	Sig::Mp4,
	exact(b"\x1A\x45\xDF\xA3", "video/webm"),
	// Fonts
	exact(b"\x00\x01\x00\x00", "font/ttf"),
	exact(b"OTTO", "font/otf"),
	exact(b"ttcf", "font/collection"),
	exact(b"wOFF", "font/woff"),
	exact(b"wOF2", "font/woff2"),
	// Archives
	exact(b"\x1F\x8B\x08", "application/x-gzip"),
	exact(b"PK\x03\x04", "application/zip"),
	exact(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
	exact(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
	exact(b"\x00\x61\x73\x6D", "application/wasm"),
	Sig::Text,
];

fn is_ws(b: u8) -> bool {
	matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' ')
}

fn is_binary(b: u8) -> bool {
	matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

fn html_matches(tag: &[u8], data: &[u8]) -> bool {
	if data.len() < tag.len() + 1 {
		return false;
	}
	let same = tag.iter().zip(data).all(|(&t, &d)| {
		let d = if t.is_ascii_uppercase() { d & 0xDF } else { d };
		t == d
	});
	same && matches!(data[tag.len()], b' ' | b'>')
}

fn masked_matches(mask: &[u8], pattern: &[u8], data: &[u8]) -> bool {
	data.len() >= pattern.len()
		&& mask
			.iter()
			.zip(pattern)
			.zip(data)
			.all(|((&m, &p), &d)| d & m == p)
}

fn mp4_matches(data: &[u8]) -> bool {
	if data.len() < 12 {
		return false;
	}
	let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
	if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
		return false;
	}
	(8..box_size)
		.step_by(4)
		// bytes 12..16 hold the minor version
		.filter(|&start| start != 12)
		.any(|start| &data[start..start + 3] == b"mp4")
}

/// Sniff the content type of `data`.
///
/// Only the first [`SNIFF_LEN`] bytes are considered. Always returns a
/// valid MIME type; unknown binary content is [`OCTET_STREAM`] and empty
/// input is plain text.
///
/// # Examples
///
/// ```
/// use sieve_http::upload::sniff::detect_content_type;
///
/// assert_eq!(detect_content_type(b"\x89PNG\x0D\x0A\x1A\x0A...."), "image/png");
/// assert_eq!(detect_content_type(b"  <html><body>hi"), "text/html; charset=utf-8");
/// assert_eq!(detect_content_type(b"hello"), "text/plain; charset=utf-8");
/// ```
pub fn detect_content_type(data: &[u8]) -> &'static str {
	let data = &data[..data.len().min(SNIFF_LEN)];
	let first_non_ws = data.iter().position(|&b| !is_ws(b)).unwrap_or(data.len());
	let trimmed = &data[first_non_ws..];

	for sig in SIGNATURES {
		let found = match sig {
			Sig::Html(tag) => html_matches(tag, trimmed).then_some("text/html; charset=utf-8"),
			Sig::Masked {
				mask,
				pattern,
				skip_ws,
				content_type,
			} => {
				let input = if *skip_ws { trimmed } else { data };
				masked_matches(mask, pattern, input).then_some(*content_type)
			}
			Sig::Exact(prefix, content_type) => data.starts_with(prefix).then_some(*content_type),
			Sig::Mp4 => mp4_matches(data).then_some("video/mp4"),
			Sig::Text => (!trimmed.iter().any(|&b| is_binary(b))).then_some(TEXT_UTF8),
		};
		if let Some(content_type) = found {
			return content_type;
		}
	}
	OCTET_STREAM
}
