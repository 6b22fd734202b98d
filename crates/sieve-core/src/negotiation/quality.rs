//! Quality-value header parsing
//!
//! Parses comma separated, weighted header values such as `Accept` or
//! `Accept-Language` into a list ordered by client preference.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

static QUALITY: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^q=([01]\.[0-9]{1,3})$").expect("quality pattern is valid")
});

/// A header token with its priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderValue {
	/// The token without parameters
	pub value: String,
	/// Quality in `[0, 1]`
	pub priority: f64,
}

impl HeaderValue {
	/// Creates a header value.
	pub fn new(value: impl Into<String>, priority: f64) -> Self {
		Self {
			value: value.into(),
			priority,
		}
	}

	/// Tie-break score: more `-` and `/` rank higher, `*` ranks lower.
	pub fn specificity(&self) -> i32 {
		specificity(&self.value)
	}
}

fn specificity(value: &str) -> i32 {
	value.chars().fold(0, |acc, c| match c {
		'-' | '/' => acc + 1,
		'*' => acc - 1,
		_ => acc,
	})
}

fn parse_priority(params: &str) -> f64 {
	QUALITY
		.captures(params.trim())
		.and_then(|caps| caps.get(1))
		.and_then(|m| m.as_str().parse::<f64>().ok())
		.filter(|q| (0.0..=1.0).contains(q))
		.unwrap_or(0.0)
}

/// Parses a weighted, comma separated header.
///
/// Entries are sorted by descending priority; entries with equal priority
/// are ordered by specificity. Malformed quality parameters never fail the
/// parse, they only push the entry to priority `0`.
///
/// # Examples
///
/// ```
/// use sieve_core::negotiation::parse_header;
///
/// let values = parse_header("text/html,text/*;q=0.5,*/*;q=0.7");
/// let order: Vec<_> = values.iter().map(|v| v.value.as_str()).collect();
/// assert_eq!(order, ["text/html", "*/*", "text/*"]);
/// assert_eq!(values[1].priority, 0.7);
/// ```
pub fn parse_header(header: &str) -> Vec<HeaderValue> {
	let header = header.trim();
	if header.is_empty() {
		return Vec::new();
	}

	let mut values: Vec<HeaderValue> = header
		.split(',')
		.map(|token| {
			let token = token.trim();
			match token.split_once(';') {
				Some((value, params)) => HeaderValue::new(value.trim(), parse_priority(params)),
				None => HeaderValue::new(token, 1.0),
			}
		})
		.collect();

	values.sort_by(|a, b| match b.priority.total_cmp(&a.priority) {
		Ordering::Equal => b.specificity().cmp(&a.specificity()),
		other => other,
	});
	values
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;

	fn pairs(values: &[HeaderValue]) -> Vec<(&str, f64)> {
		values.iter().map(|v| (v.value.as_str(), v.priority)).collect()
	}

	#[rstest]
	fn test_accept_with_wildcards() {
		// Act
		let values = parse_header("text/html,text/*;q=0.5,*/*;q=0.7");

		// Assert
		assert_eq!(
			pairs(&values),
			vec![("text/html", 1.0), ("*/*", 0.7), ("text/*", 0.5)]
		);
	}

	#[rstest]
	fn test_accept_language_specificity_breaks_ties() {
		// Act
		let values = parse_header("fr , en-FR;q=0.9, en;q=0.9, *;q=0.9");

		// Assert
		assert_eq!(
			pairs(&values),
			vec![("fr", 1.0), ("en-FR", 0.9), ("en", 0.9), ("*", 0.9)]
		);
	}

	#[rstest]
	#[case("")]
	#[case("   ")]
	#[case("\t\n")]
	fn test_blank_header_is_empty(#[case] header: &str) {
		assert!(parse_header(header).is_empty());
	}

	#[rstest]
	#[case("text/html;q=abc")]
	#[case("text/html;q=2.0")]
	#[case("text/html;q=1")]
	#[case("text/html;level=1")]
	#[case("text/html;q=0.12345")]
	fn test_malformed_quality_is_deprioritized(#[case] header: &str) {
		let values = parse_header(header);

		assert_eq!(pairs(&values), vec![("text/html", 0.0)]);
	}

	#[rstest]
	fn test_quality_parameter_may_be_padded() {
		let values = parse_header("text/plain; q=0.3 ");

		assert_eq!(pairs(&values), vec![("text/plain", 0.3)]);
	}

	#[rstest]
	#[case("text/html", 1)]
	#[case("*/*", -1)]
	#[case("text/*", 0)]
	#[case("en-US", 1)]
	#[case("application/vnd.api-v2+json", 2)]
	fn test_specificity(#[case] value: &str, #[case] expected: i32) {
		assert_eq!(HeaderValue::new(value, 1.0).specificity(), expected);
	}

	proptest! {
		#[test]
		fn prop_sorted_by_priority_then_specificity(
			tokens in proptest::collection::vec(("[a-z*/-]{1,8}", proptest::option::of(0u32..=1000)), 0..12)
		) {
			let header = tokens
				.iter()
				.map(|(v, q)| match q {
					Some(q) => format!("{};q={}.{:03}", v, q / 1000, q % 1000),
					None => v.clone(),
				})
				.collect::<Vec<_>>()
				.join(",");

			let values = parse_header(&header);

			for pair in values.windows(2) {
				prop_assert!(pair[0].priority >= pair[1].priority);
				if pair[0].priority == pair[1].priority {
					prop_assert!(pair[0].specificity() >= pair[1].specificity());
				}
			}
		}
	}
}
