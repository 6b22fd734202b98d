//! Structured error accumulator
//!
//! [`StructuredError`] gathers one or more failure reasons together with a
//! snapshot of the call stack taken where the failure was detected. It is
//! meant to travel with a request so that logging and telemetry can report
//! both the cause and the triggering line of code.
//!
//! Whether a value is already a [`StructuredError`] is decided at the
//! construction site through [`Cause`]: passing [`Cause::Existing`] hands the
//! error back untouched instead of wrapping it a second time.
//!
//! # Examples
//!
//! ```
//! use sieve_core::exception::{Cause, StructuredError};
//! use std::io;
//!
//! let err = StructuredError::new(io::Error::other("disk on fire"));
//! assert_eq!(err.to_string(), "disk on fire");
//!
//! // Wrapping an existing structured error is a no-op.
//! let same = StructuredError::wrap(Cause::Existing(err.clone())).unwrap();
//! assert!(same.ptr_eq(&err));
//!
//! // Wrapping nothing yields nothing.
//! assert!(StructuredError::wrap(Cause::Absent).is_none());
//! ```

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use super::stack::{CallStack, Frame};

/// Boxed, thread-safe error.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Message used when an error carries no reasons at all.
pub const NO_REASONS: &str = "structured error without reasons";

/// Placeholder for a reason that holds no value.
pub const NIL_REASON: &str = "<nil>";

/// A single cause recorded in a [`StructuredError`].
#[derive(Clone)]
pub enum Reason {
	/// An ordinary error
	Error(Arc<dyn StdError + Send + Sync + 'static>),
	/// A structured error with its own captured stack
	Nested(StructuredError),
	/// Any other value, kept as-is for structured output
	Value(Value),
}

impl Reason {
	/// Creates an error reason.
	pub fn error<E>(err: E) -> Self
	where
		E: Into<BoxError>,
	{
		Reason::Error(Arc::from(err.into()))
	}

	/// Creates an opaque value reason.
	pub fn value(value: impl Into<Value>) -> Self {
		Reason::Value(value.into())
	}

	fn is_nil(&self) -> bool {
		matches!(self, Reason::Value(Value::Null))
	}

	/// Human readable message of this reason.
	pub fn message(&self) -> String {
		match self {
			Reason::Error(err) => err.to_string(),
			Reason::Nested(nested) => nested.to_string(),
			Reason::Value(Value::Null) => NIL_REASON.to_string(),
			Reason::Value(Value::String(s)) => s.clone(),
			Reason::Value(other) => other.to_string(),
		}
	}
}

impl fmt::Debug for Reason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Reason::Error(err) => f.debug_tuple("Error").field(err).finish(),
			Reason::Nested(nested) => f.debug_tuple("Nested").field(&nested.to_string()).finish(),
			Reason::Value(value) => f.debug_tuple("Value").field(value).finish(),
		}
	}
}

impl Serialize for Reason {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Reason::Error(err) => serializer.serialize_str(&err.to_string()),
			Reason::Nested(nested) => nested.serialize(serializer),
			Reason::Value(value) => value.serialize(serializer),
		}
	}
}

/// What a construction site hands to [`StructuredError::wrap`].
#[derive(Debug)]
pub enum Cause {
	/// Nothing failed
	Absent,
	/// Already structured, returned unchanged
	Existing(StructuredError),
	/// A single error
	Error(BoxError),
	/// A list of errors; `None` entries are dropped
	Errors(Vec<Option<BoxError>>),
	/// A heterogeneous list; `Value::Null` entries are dropped
	Mixed(Vec<Reason>),
	/// Any other single value
	Value(Value),
}

impl Cause {
	/// Convenience constructor for a single error.
	pub fn error<E>(err: E) -> Self
	where
		E: Into<BoxError>,
	{
		Cause::Error(err.into())
	}
}

impl From<StructuredError> for Cause {
	fn from(err: StructuredError) -> Self {
		Cause::Existing(err)
	}
}

impl From<Option<StructuredError>> for Cause {
	fn from(err: Option<StructuredError>) -> Self {
		err.map_or(Cause::Absent, Cause::Existing)
	}
}

impl From<Value> for Cause {
	fn from(value: Value) -> Self {
		match value {
			Value::Null => Cause::Absent,
			other => Cause::Value(other),
		}
	}
}

impl From<Vec<Option<BoxError>>> for Cause {
	fn from(errors: Vec<Option<BoxError>>) -> Self {
		Cause::Errors(errors)
	}
}

impl From<Vec<Reason>> for Cause {
	fn from(reasons: Vec<Reason>) -> Self {
		Cause::Mixed(reasons)
	}
}

struct Inner {
	reasons: Vec<Reason>,
	stack: CallStack,
}

/// One or more failure reasons plus the stack captured at construction.
///
/// Cloning is cheap and shares the same reasons and snapshot.
#[derive(Clone)]
pub struct StructuredError {
	inner: Arc<Inner>,
}

impl StructuredError {
	/// Wraps a single error, capturing the caller's stack.
	#[inline(never)]
	pub fn new<E>(err: E) -> Self
	where
		E: Into<BoxError>,
	{
		Self::from_reasons(vec![Reason::error(err)], 1)
	}

	/// Wraps `cause`, capturing the caller's stack.
	///
	/// Returns `None` for [`Cause::Absent`] and the same error for
	/// [`Cause::Existing`].
	#[inline(never)]
	pub fn wrap(cause: impl Into<Cause>) -> Option<Self> {
		Self::wrap_skip(cause, 1)
	}

	/// Like [`wrap`](Self::wrap), dropping `skip` additional innermost frames
	/// from the snapshot. Helpers that build errors on behalf of their caller
	/// pass `1` so the recorded origin is the helper's caller.
	#[inline(never)]
	pub fn wrap_skip(cause: impl Into<Cause>, skip: usize) -> Option<Self> {
		let reasons = match cause.into() {
			Cause::Absent => return None,
			Cause::Existing(err) => return Some(err),
			Cause::Error(err) => vec![Reason::error(err)],
			Cause::Errors(errors) => errors.into_iter().flatten().map(Reason::error).collect(),
			Cause::Mixed(items) => items.into_iter().filter(|r| !r.is_nil()).collect(),
			Cause::Value(value) => vec![Reason::Value(value)],
		};
		Some(Self::from_reasons(reasons, skip + 1))
	}

	/// Builds an error from already classified reasons. Nothing is filtered.
	#[inline(never)]
	pub fn from_reasons(reasons: Vec<Reason>, skip: usize) -> Self {
		Self {
			inner: Arc::new(Inner {
				reasons,
				stack: CallStack::capture(skip + 1),
			}),
		}
	}

	/// Builds an error that carries no stack snapshot.
	pub fn without_stack(reasons: Vec<Reason>) -> Self {
		Self {
			inner: Arc::new(Inner {
				reasons,
				stack: CallStack::empty(),
			}),
		}
	}

	/// The recorded reasons in order.
	pub fn reasons(&self) -> &[Reason] {
		&self.inner.reasons
	}

	/// The captured stack snapshot.
	pub fn stack(&self) -> &CallStack {
		&self.inner.stack
	}

	/// Resolved frames of the captured stack.
	pub fn frames(&self) -> &[Frame] {
		self.inner.stack.frames()
	}

	/// `file:line` of the first captured frame.
	pub fn file_line(&self) -> String {
		self.inner.stack.file_line()
	}

	/// Whether both handles point at the same error.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	/// Finds the first reason of type `E`, descending into nested errors.
	pub fn find<E>(&self) -> Option<&E>
	where
		E: StdError + 'static,
	{
		self.inner.reasons.iter().find_map(|reason| match reason {
			Reason::Error(err) => err.downcast_ref::<E>(),
			Reason::Nested(nested) => nested.find::<E>(),
			Reason::Value(_) => None,
		})
	}

	/// Multi-line report with stack traces.
	///
	/// A single reason renders as its message followed by the trace. With
	/// several reasons each one gets its own block, separated by a blank
	/// line; nested structured errors print their own stack instead of this
	/// one.
	pub fn report(&self) -> String {
		match self.inner.reasons.as_slice() {
			[] => format!("{}\n{}", NO_REASONS, self.inner.stack),
			[single] => self.reason_block(single),
			reasons => reasons
				.iter()
				.map(|reason| self.reason_block(reason))
				.collect::<Vec<_>>()
				.join("\n\n"),
		}
	}

	fn reason_block(&self, reason: &Reason) -> String {
		match reason {
			Reason::Nested(nested) => nested.report(),
			other => format!("{}\n{}", other.message(), self.inner.stack),
		}
	}
}

impl fmt::Display for StructuredError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.inner.reasons.is_empty() {
			return f.write_str(NO_REASONS);
		}
		for (i, reason) in self.inner.reasons.iter().enumerate() {
			if i > 0 {
				writeln!(f)?;
			}
			f.write_str(&reason.message())?;
		}
		Ok(())
	}
}

impl fmt::Debug for StructuredError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.report())
	}
}

impl StdError for StructuredError {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		self.inner.reasons.iter().find_map(|reason| match reason {
			Reason::Error(err) => Some(err.as_ref() as &(dyn StdError + 'static)),
			Reason::Nested(nested) => Some(nested as &(dyn StdError + 'static)),
			Reason::Value(_) => None,
		})
	}
}

impl Serialize for StructuredError {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self.inner.reasons.as_slice() {
			[] => serializer.serialize_str(NO_REASONS),
			[single] => single.serialize(serializer),
			reasons => {
				let mut seq = serializer.serialize_seq(Some(reasons.len()))?;
				for reason in reasons {
					seq.serialize_element(reason)?;
				}
				seq.end()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::io;

	fn io_err(msg: &str) -> BoxError {
		Box::new(io::Error::other(msg.to_string()))
	}

	#[rstest]
	fn test_wrap_absent_is_none() {
		assert!(StructuredError::wrap(Cause::Absent).is_none());
		assert!(StructuredError::wrap(Value::Null).is_none());
		assert!(StructuredError::wrap(None::<StructuredError>).is_none());
	}

	#[rstest]
	fn test_wrap_existing_is_unchanged() {
		// Arrange
		let original = StructuredError::new(io_err("boom"));

		// Act
		let wrapped = StructuredError::wrap(original.clone()).unwrap();

		// Assert
		assert!(wrapped.ptr_eq(&original));
		assert_eq!(wrapped.reasons().len(), 1);
	}

	#[rstest]
	fn test_wrap_error_list_drops_missing_entries() {
		// Arrange
		let errors = vec![Some(io_err("first")), None, Some(io_err("second"))];

		// Act
		let err = StructuredError::wrap(errors).unwrap();

		// Assert
		assert_eq!(err.reasons().len(), 2);
		assert_eq!(err.to_string(), "first\nsecond");
	}

	#[rstest]
	fn test_wrap_mixed_list_classifies_items() {
		// Arrange
		let nested = StructuredError::new(io_err("inner"));
		let items = vec![
			Reason::error(io_err("plain")),
			Reason::Value(Value::Null),
			Reason::Nested(nested),
			Reason::value(json!({"field": "email"})),
		];

		// Act
		let err = StructuredError::wrap(items).unwrap();

		// Assert
		assert_eq!(err.reasons().len(), 3);
		assert!(matches!(err.reasons()[0], Reason::Error(_)));
		assert!(matches!(err.reasons()[1], Reason::Nested(_)));
		assert!(matches!(err.reasons()[2], Reason::Value(_)));
	}

	#[rstest]
	fn test_display_without_reasons_uses_sentinel() {
		let err = StructuredError::without_stack(vec![]);

		assert_eq!(err.to_string(), NO_REASONS);
		assert_eq!(serde_json::to_value(&err).unwrap(), json!(NO_REASONS));
	}

	#[rstest]
	fn test_display_nil_reason_placeholder() {
		let err = StructuredError::without_stack(vec![Reason::Value(Value::Null)]);

		assert_eq!(err.to_string(), NIL_REASON);
	}

	#[rstest]
	#[case(json!("plain string"))]
	#[case(json!(42))]
	#[case(json!({"a": [1, 2, 3]}))]
	fn test_single_value_serializes_without_envelope(#[case] value: Value) {
		// Act
		let err = StructuredError::wrap(value.clone()).unwrap();

		// Assert
		assert_eq!(serde_json::to_value(&err).unwrap(), value);
	}

	#[rstest]
	fn test_multiple_reasons_serialize_as_list() {
		// Arrange
		let nested = StructuredError::wrap(json!({"code": 7})).unwrap();
		let err = StructuredError::wrap(vec![
			Reason::error(io_err("io failure")),
			Reason::Nested(nested),
		])
		.unwrap();

		// Act
		let value = serde_json::to_value(&err).unwrap();

		// Assert
		assert_eq!(value, json!(["io failure", {"code": 7}]));
	}

	#[rstest]
	fn test_find_descends_into_nested() {
		// Arrange
		let nested = StructuredError::new(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
		let err = StructuredError::wrap(vec![
			Reason::value("context"),
			Reason::Nested(nested),
		])
		.unwrap();

		// Act
		let found = err.find::<io::Error>();

		// Assert
		assert_eq!(found.map(|e| e.kind()), Some(io::ErrorKind::UnexpectedEof));
	}

	#[rstest]
	fn test_report_single_reason_starts_with_message() {
		let err = StructuredError::new(io_err("broken pipe"));

		assert!(err.report().starts_with("broken pipe\n"));
	}

	#[rstest]
	fn test_report_multiple_reasons_are_separated_by_blank_line() {
		// Arrange
		let err = StructuredError::without_stack(vec![
			Reason::value("first"),
			Reason::Nested(StructuredError::without_stack(vec![Reason::value("second")])),
		]);

		// Act
		let report = err.report();

		// Assert
		assert_eq!(report, "first\n\n\nsecond\n");
	}

	#[rstest]
	fn test_file_line_without_frames() {
		let err = StructuredError::without_stack(vec![Reason::value("x")]);

		assert_eq!(err.file_line(), super::super::stack::UNKNOWN_LOCATION);
	}

	#[rstest]
	fn test_source_is_first_error_reason() {
		let err = StructuredError::wrap(vec![Reason::value("ctx"), Reason::error(io_err("root"))])
			.unwrap();

		assert_eq!(err.source().map(|e| e.to_string()), Some("root".to_string()));
	}
}
