//! Small generic helpers.

/// Whether `slice` contains `value`.
///
/// # Examples
///
/// ```
/// use sieve_core::utils::contains;
///
/// assert!(contains(&["a", "b"], &"b"));
/// assert!(!contains(&[1, 2, 3], &4));
/// ```
pub fn contains<T: PartialEq>(slice: &[T], value: &T) -> bool {
	slice.iter().any(|item| item == value)
}

/// Whether two slices hold equal elements in the same order.
pub fn equal<T: PartialEq>(a: &[T], b: &[T]) -> bool {
	a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_contains_strings() {
		let items = vec!["json".to_string(), "form".to_string()];

		assert!(contains(&items, &"form".to_string()));
		assert!(!contains(&items, &"xml".to_string()));
		assert!(!contains::<u8>(&[], &0));
	}

	#[rstest]
	#[case(&[1, 2], &[1, 2], true)]
	#[case(&[1, 2], &[2, 1], false)]
	#[case(&[1], &[1, 1], false)]
	#[case(&[], &[], true)]
	fn test_equal(#[case] a: &[i32], #[case] b: &[i32], #[case] expected: bool) {
		assert_eq!(equal(a, b), expected);
	}
}
