//! Content negotiation helpers
//!
//! [`parse_header`] turns weighted headers (`Accept`, `Accept-Language`,
//! `Accept-Encoding`, ...) into a preference ordered list of [`HeaderValue`].
//! [`best_match`] picks the first offered value a client accepts.

pub mod quality;

pub use quality::{HeaderValue, parse_header};

fn accepts(pattern: &str, candidate: &str) -> bool {
	if pattern == "*" || pattern == "*/*" || pattern.eq_ignore_ascii_case(candidate) {
		return true;
	}
	match pattern.strip_suffix("/*") {
		Some(prefix) => candidate
			.split_once('/')
			.is_some_and(|(kind, _)| kind.eq_ignore_ascii_case(prefix)),
		None => false,
	}
}

/// Returns the first of `available` accepted by `header`, in client
/// preference order.
///
/// Entries with priority `0` are treated as "not acceptable".
///
/// # Examples
///
/// ```
/// use sieve_core::negotiation::best_match;
///
/// let available = ["application/json", "text/html"];
/// assert_eq!(best_match("text/*;q=0.8, application/xml", &available), Some("text/html"));
/// assert_eq!(best_match("image/png", &available), None);
/// ```
pub fn best_match<'a, S>(header: &str, available: &'a [S]) -> Option<&'a str>
where
	S: AsRef<str>,
{
	let offered: Vec<&str> = available.iter().map(AsRef::as_ref).collect();
	for accepted in parse_header(header) {
		if accepted.priority <= 0.0 {
			continue;
		}
		if let Some(found) = offered.iter().find(|o| accepts(&accepted.value, o)) {
			return Some(*found);
		}
	}
	None
}
