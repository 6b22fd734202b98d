//! Call stack snapshots for structured errors
//!
//! A [`CallStack`] records raw instruction pointers when it is captured and
//! only resolves them to function names and source locations the first time
//! somebody asks for them.

use once_cell::sync::OnceCell;
use std::ffi::c_void;
use std::fmt;

/// Maximum number of frames kept in a snapshot.
pub const MAX_FRAMES: usize = 32;

/// Rendered in place of a location when no frame was captured.
pub const UNKNOWN_LOCATION: &str = "unknown:0";

/// A resolved stack frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
	/// Demangled function name, if the symbol could be resolved
	pub function: Option<String>,
	/// Source file, if debug information is available
	pub file: Option<String>,
	/// Source line, if debug information is available
	pub line: Option<u32>,
}

impl Frame {
	/// Returns `file:line` for this frame.
	pub fn location(&self) -> String {
		format!(
			"{}:{}",
			self.file.as_deref().unwrap_or("unknown"),
			self.line.unwrap_or(0)
		)
	}
}

impl fmt::Display for Frame {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{}", self.function.as_deref().unwrap_or("<unknown>"))?;
		write!(f, "\t{}", self.location())
	}
}

/// Immutable snapshot of the calling stack.
///
/// Only instruction pointers are stored at capture time. Resolution into
/// [`Frame`]s happens lazily and at most once.
#[derive(Default)]
pub struct CallStack {
	ips: Vec<usize>,
	resolved: OnceCell<Vec<Frame>>,
}

impl CallStack {
	/// Captures the current stack.
	///
	/// Frames belonging to the capture machinery are always dropped; `skip`
	/// additional innermost frames are dropped after that so the first frame
	/// is the caller's failure site.
	#[inline(never)]
	pub fn capture(skip: usize) -> Self {
		let anchor = Self::capture as fn(usize) -> Self as usize;
		let mut raw = Vec::with_capacity(MAX_FRAMES + skip + 8);
		let mut anchor_index = None;

		backtrace::trace(|frame| {
			if anchor_index.is_none() && frame.symbol_address() as usize == anchor {
				anchor_index = Some(raw.len());
			}
			raw.push(frame.ip() as usize);
			raw.len() < MAX_FRAMES + skip + 64
		});

		// Without an anchor (stripped or heavily inlined builds) keep
		// everything rather than guessing an offset.
		let start = anchor_index.map(|i| i + 1).unwrap_or(0) + skip;
		let ips = raw.into_iter().skip(start).take(MAX_FRAMES).collect();

		Self {
			ips,
			resolved: OnceCell::new(),
		}
	}

	/// A snapshot with no frames.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Number of captured frames.
	pub fn len(&self) -> usize {
		self.ips.len()
	}

	/// Whether no frame was captured.
	pub fn is_empty(&self) -> bool {
		self.ips.is_empty()
	}

	/// Whether symbols have been resolved yet.
	pub fn is_resolved(&self) -> bool {
		self.resolved.get().is_some()
	}

	/// Resolved frames, computed on first access.
	pub fn frames(&self) -> &[Frame] {
		self.resolved.get_or_init(|| {
			self.ips
				.iter()
				.map(|&ip| {
					let mut frame = Frame {
						function: None,
						file: None,
						line: None,
					};
					backtrace::resolve(ip as *mut c_void, |symbol| {
						// Inlined frames resolve to several symbols; keep the first.
						if frame.function.is_none() {
							frame.function = symbol.name().map(|n| n.to_string());
							frame.file = symbol.filename().map(|p| p.display().to_string());
							frame.line = symbol.lineno();
						}
					});
					frame
				})
				.collect()
		})
	}

	/// `file:line` of the first captured frame, or [`UNKNOWN_LOCATION`].
	pub fn file_line(&self) -> String {
		match self.frames().first() {
			Some(frame) => frame.location(),
			None => UNKNOWN_LOCATION.to_string(),
		}
	}
}

impl fmt::Display for CallStack {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, frame) in self.frames().iter().enumerate() {
			if i > 0 {
				writeln!(f)?;
			}
			write!(f, "{}", frame)?;
		}
		Ok(())
	}
}

impl fmt::Debug for CallStack {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CallStack")
			.field("frames", &self.ips.len())
			.finish()
	}
}
