//! Multi-valued field flattening

use indexmap::IndexMap;
use sieve_http::ParsedValue;

/// Values grouped by key, in first-seen key order.
pub type MultiMap = IndexMap<String, Vec<String>>;

/// Group `(key, value)` pairs by key, keeping occurrence order.
pub fn group<I, K, V>(pairs: I) -> MultiMap
where
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Into<String>,
{
	let mut grouped = MultiMap::new();
	for (key, value) in pairs {
		grouped.entry(key.into()).or_default().push(value.into());
	}
	grouped
}

/// Collapse single values to scalars.
///
/// A key seen once maps to [`ParsedValue::Single`], a key seen several
/// times maps to [`ParsedValue::Multiple`] in occurrence order.
///
/// # Examples
///
/// ```
/// use sieve_http::ParsedValue;
/// use sieve_parsers::flatten::{flatten, group};
///
/// let flat = flatten(group([("a", "b"), ("x", "1"), ("x", "2")]));
/// assert_eq!(flat["a"], ParsedValue::Single("b".into()));
/// assert_eq!(flat["x"], ParsedValue::Multiple(vec!["1".into(), "2".into()]));
/// ```
pub fn flatten<I>(values: I) -> IndexMap<String, ParsedValue>
where
	I: IntoIterator<Item = (String, Vec<String>)>,
{
	values
		.into_iter()
		.map(|(key, mut values)| {
			let value = if values.len() == 1 {
				ParsedValue::Single(values.remove(0))
			} else {
				ParsedValue::Multiple(values)
			};
			(key, value)
		})
		.collect()
}
