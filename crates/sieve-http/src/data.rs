//! Parsed request data
//!
//! [`QueryMap`] and [`RequestData`] preserve the order in which keys were
//! first seen on the wire.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::upload::UploadedFile;

/// A flattened wire value: one occurrence is a scalar, several are a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedValue {
	Single(String),
	Multiple(Vec<String>),
}

impl ParsedValue {
	/// The scalar value, if the key was seen exactly once.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			ParsedValue::Single(value) => Some(value),
			ParsedValue::Multiple(_) => None,
		}
	}

	/// All values in occurrence order.
	pub fn values(&self) -> Vec<&str> {
		match self {
			ParsedValue::Single(value) => vec![value.as_str()],
			ParsedValue::Multiple(values) => values.iter().map(String::as_str).collect(),
		}
	}

	/// Number of occurrences
	pub fn len(&self) -> usize {
		match self {
			ParsedValue::Single(_) => 1,
			ParsedValue::Multiple(values) => values.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl From<&str> for ParsedValue {
	fn from(value: &str) -> Self {
		ParsedValue::Single(value.to_string())
	}
}

impl From<String> for ParsedValue {
	fn from(value: String) -> Self {
		ParsedValue::Single(value)
	}
}

impl From<Vec<String>> for ParsedValue {
	fn from(values: Vec<String>) -> Self {
		ParsedValue::Multiple(values)
	}
}

/// Decoded query string. Present (possibly empty) once the request has
/// been parsed.
pub type QueryMap = IndexMap<String, ParsedValue>;

/// Fields decoded from a form or multipart body.
pub type RequestData = IndexMap<String, DataValue>;

/// A value stored in [`RequestData`].
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DataValue {
	/// A form or multipart text field
	Field(ParsedValue),
	/// Files uploaded under one multipart field name
	Files(Vec<UploadedFile>),
}

impl DataValue {
	/// The value as a single string, for fields seen once.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			DataValue::Field(value) => value.as_str(),
			DataValue::Files(_) => None,
		}
	}

	pub fn as_field(&self) -> Option<&ParsedValue> {
		match self {
			DataValue::Field(value) => Some(value),
			DataValue::Files(_) => None,
		}
	}

	pub fn as_files(&self) -> Option<&[UploadedFile]> {
		match self {
			DataValue::Files(files) => Some(files),
			DataValue::Field(_) => None,
		}
	}

	/// Take ownership of uploaded files, e.g. to consume their streams.
	pub fn into_files(self) -> Option<Vec<UploadedFile>> {
		match self {
			DataValue::Files(files) => Some(files),
			DataValue::Field(_) => None,
		}
	}
}

impl From<ParsedValue> for DataValue {
	fn from(value: ParsedValue) -> Self {
		DataValue::Field(value)
	}
}

impl From<Vec<UploadedFile>> for DataValue {
	fn from(files: Vec<UploadedFile>) -> Self {
		DataValue::Files(files)
	}
}

/// Decoded request body.
///
/// JSON bodies keep whatever shape they were sent in; form and multipart
/// bodies are field maps.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Data {
	/// Form or multipart fields
	Fields(RequestData),
	/// A JSON document: object, array or scalar
	Json(Value),
}

impl Data {
	pub fn fields(&self) -> Option<&RequestData> {
		match self {
			Data::Fields(fields) => Some(fields),
			Data::Json(_) => None,
		}
	}

	pub fn into_fields(self) -> Option<RequestData> {
		match self {
			Data::Fields(fields) => Some(fields),
			Data::Json(_) => None,
		}
	}

	pub fn json(&self) -> Option<&Value> {
		match self {
			Data::Json(value) => Some(value),
			Data::Fields(_) => None,
		}
	}

	/// String stored under `key`: a field seen once, or a string member of a
	/// JSON object.
	///
	/// # Examples
	///
	/// ```
	/// use sieve_http::Data;
	///
	/// let data = Data::from(serde_json::json!({"a": "b", "n": 1}));
	/// assert_eq!(data.get_str("a"), Some("b"));
	/// assert_eq!(data.get_str("n"), None);
	/// ```
	pub fn get_str(&self, key: &str) -> Option<&str> {
		match self {
			Data::Fields(fields) => fields.get(key).and_then(DataValue::as_str),
			Data::Json(value) => value.get(key).and_then(Value::as_str),
		}
	}

	/// `true` for an empty field map, `{}` or `[]`.
	pub fn is_empty(&self) -> bool {
		match self {
			Data::Fields(fields) => fields.is_empty(),
			Data::Json(Value::Object(members)) => members.is_empty(),
			Data::Json(Value::Array(items)) => items.is_empty(),
			Data::Json(_) => false,
		}
	}
}

impl From<RequestData> for Data {
	fn from(fields: RequestData) -> Self {
		Data::Fields(fields)
	}
}

impl From<Value> for Data {
	fn from(value: Value) -> Self {
		Data::Json(value)
	}
}
