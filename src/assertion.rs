//! Assertions for unit bodies.
//!
//! Every check is one of a closed set of [`Assertion`] variants. A violated check
//! produces an [`AssertionViolation`] that records the expected and actual
//! values as rendered text, which the runner classifies as `Failed`.
//!
//! ```
//! use verdict::assertion::{contains, equals};
//! use verdict::UnitResult;
//!
//! fn body() -> UnitResult {
//!     let data = vec![1, 2, 3, 4, 5];
//!     equals(15, data.iter().sum::<i32>())?;
//!     contains(&3, &data)?;
//!     Ok(())
//! }
//! assert!(body().is_ok());
//! ```

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug};
use std::hash::Hash;

use serde::Serialize;

/// The closed set of assertion kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assertion {
    /// Two values compare equal, or unequal when `negated`.
    Equals { negated: bool },
    /// A container holds a member, or lacks it when `negated`.
    Contains { negated: bool },
    /// An operation returns an error.
    Raises,
    /// A condition evaluates to `expected`.
    IsTrue { expected: bool },
}

impl Assertion {
    fn message(&self) -> &'static str {
        match self {
            Assertion::Equals { negated: false } => "values differ",
            Assertion::Equals { negated: true } => "values are equal",
            Assertion::Contains { negated: false } => "member not found",
            Assertion::Contains { negated: true } => "unexpected member found",
            Assertion::Raises => "no error raised",
            Assertion::IsTrue { expected: true } => "condition is false",
            Assertion::IsTrue { expected: false } => "condition is true",
        }
    }

    /// Turns the evaluated check into a verdict.
    ///
    /// `expected` and `actual` are only rendered when the check does not hold.
    pub fn check<E, A>(self, holds: bool, expected: E, actual: A) -> Result<(), AssertionViolation>
    where
        E: FnOnce() -> String,
        A: FnOnce() -> String,
    {
        if holds {
            return Ok(());
        }
        Err(AssertionViolation {
            assertion: self,
            message: self.message().to_string(),
            expected: expected(),
            actual: actual(),
        })
    }
}

/// A violated assertion with both sides of the comparison captured.
///
/// Not a `std::error::Error`; see [`crate::UnitError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionViolation {
    pub assertion: Assertion,
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl AssertionViolation {
    /// Adds caller context in front of the message.
    pub fn context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }
}

impl fmt::Display for AssertionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, actual {}",
            self.message, self.expected, self.actual
        )
    }
}

// ============================================================================
// MEMBERSHIP
// ============================================================================

/// Containers that can answer "is this a member?".
///
/// Strings test for substrings, sequences for elements, maps and JSON
/// objects for keys.
pub trait Membership<N: ?Sized> {
    fn has_member(&self, needle: &N) -> bool;
}

impl Membership<str> for str {
    fn has_member(&self, needle: &str) -> bool {
        self.contains(needle)
    }
}

impl Membership<str> for String {
    fn has_member(&self, needle: &str) -> bool {
        self.as_str().contains(needle)
    }
}

impl<T: PartialEq> Membership<T> for [T] {
    fn has_member(&self, needle: &T) -> bool {
        self.contains(needle)
    }
}

impl<T: PartialEq> Membership<T> for Vec<T> {
    fn has_member(&self, needle: &T) -> bool {
        self.as_slice().contains(needle)
    }
}

impl<K, V, Q> Membership<Q> for HashMap<K, V>
where
    K: Borrow<Q> + Eq + Hash,
    Q: Eq + Hash + ?Sized,
{
    fn has_member(&self, needle: &Q) -> bool {
        self.contains_key(needle)
    }
}

impl<K, V, Q> Membership<Q> for BTreeMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    fn has_member(&self, needle: &Q) -> bool {
        self.contains_key(needle)
    }
}

impl Membership<str> for serde_json::Map<String, serde_json::Value> {
    fn has_member(&self, needle: &str) -> bool {
        self.contains_key(needle)
    }
}

impl Membership<str> for serde_json::Value {
    fn has_member(&self, needle: &str) -> bool {
        match self {
            serde_json::Value::Object(map) => map.contains_key(needle),
            serde_json::Value::Array(items) => items.iter().any(|v| v.as_str() == Some(needle)),
            serde_json::Value::String(s) => s.contains(needle),
            _ => false,
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Passes when `actual == expected`.
pub fn equals<E, A>(expected: E, actual: A) -> Result<(), AssertionViolation>
where
    E: Debug,
    A: PartialEq<E> + Debug,
{
    Assertion::Equals { negated: false }.check(
        actual == expected,
        || format!("{expected:?}"),
        || format!("{actual:?}"),
    )
}

/// Passes when `actual != unexpected`.
pub fn not_equals<E, A>(unexpected: E, actual: A) -> Result<(), AssertionViolation>
where
    E: Debug,
    A: PartialEq<E> + Debug,
{
    Assertion::Equals { negated: true }.check(
        actual != unexpected,
        || format!("anything but {unexpected:?}"),
        || format!("{actual:?}"),
    )
}

/// Passes when `haystack` holds `needle`.
pub fn contains<N, H>(needle: &N, haystack: &H) -> Result<(), AssertionViolation>
where
    N: Debug + ?Sized,
    H: Membership<N> + Debug + ?Sized,
{
    Assertion::Contains { negated: false }.check(
        haystack.has_member(needle),
        || format!("{needle:?} in container"),
        || format!("{haystack:?}"),
    )
}

/// Passes when `haystack` does not hold `needle`.
pub fn not_contains<N, H>(needle: &N, haystack: &H) -> Result<(), AssertionViolation>
where
    N: Debug + ?Sized,
    H: Membership<N> + Debug + ?Sized,
{
    Assertion::Contains { negated: true }.check(
        !haystack.has_member(needle),
        || format!("{needle:?} not in container"),
        || format!("{haystack:?}"),
    )
}

pub fn is_true(condition: bool) -> Result<(), AssertionViolation> {
    Assertion::IsTrue { expected: true }.check(condition, || "true".into(), || "false".into())
}

pub fn is_false(condition: bool) -> Result<(), AssertionViolation> {
    Assertion::IsTrue { expected: false }.check(!condition, || "false".into(), || "true".into())
}

/// Like [`is_true`], but names the condition in the expected text.
pub fn holds(description: &str, condition: bool) -> Result<(), AssertionViolation> {
    Assertion::IsTrue { expected: true }.check(
        condition,
        || format!("`{description}` to hold"),
        || "false".into(),
    )
}

pub fn is_some<T: Debug>(value: &Option<T>) -> Result<(), AssertionViolation> {
    Assertion::IsTrue { expected: true }.check(
        value.is_some(),
        || "Some(_)".into(),
        || "None".into(),
    )
}

/// Passes when `op` returns an error, handing that error back for further checks.
pub fn raises<T, E, F>(op: F) -> Result<E, AssertionViolation>
where
    T: Debug,
    F: FnOnce() -> Result<T, E>,
{
    match op() {
        Err(err) => Ok(err),
        Ok(value) => Err(AssertionViolation {
            assertion: Assertion::Raises,
            message: Assertion::Raises.message().to_string(),
            expected: "an error".to_string(),
            actual: format!("Ok({value:?})"),
        }),
    }
}

/// Asserts a boolean expression, naming it in the violation.
///
/// ```
/// use verdict::ensure;
///
/// fn body() -> verdict::UnitResult {
///     let greeting = "Hello, World!";
///     ensure!(greeting.starts_with("Hello"));
///     Ok(())
/// }
/// assert!(body().is_ok());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr) => {
        $crate::assertion::holds(stringify!($cond), $cond)?
    };
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn equals_reports_both_sides() {
        let violation = equals(4, "abc".len()).unwrap_err();
        assert_eq!(violation.assertion, Assertion::Equals { negated: false });
        assert_eq!(violation.expected, "4");
        assert_eq!(violation.actual, "3");
        assert_eq!(violation.to_string(), "values differ: expected 4, actual 3");
    }

    #[test]
    fn not_equals_rejects_equal_values() {
        assert!(not_equals(1, 2).is_ok());
        let violation = not_equals("a", "a").unwrap_err();
        assert_eq!(violation.message, "values are equal");
    }

    #[test]
    fn membership_covers_strings_sequences_and_maps() {
        assert!(contains("World", "Hello, World!").is_ok());
        assert!(not_contains("Python", &"Hello".to_string()).is_ok());
        assert!(contains(&3, &vec![1, 2, 3]).is_ok());
        assert!(not_contains(&6, &[1, 2, 3][..]).is_ok());

        let mut map = HashMap::new();
        map.insert("id".to_string(), 1);
        assert!(contains("id", &map).is_ok());
        assert!(contains("name", &map).is_err());

        let body = json!({"id": 1, "tags": ["a", "b"]});
        assert!(contains("id", &body).is_ok());
        assert!(contains("b", &body["tags"]).is_ok());
        assert!(contains("id", &json!(3)).is_err());
    }

    #[test]
    fn contains_violation_names_needle() {
        let violation = contains(&9, &vec![1, 2]).unwrap_err();
        assert_eq!(violation.expected, "9 in container");
        assert_eq!(violation.actual, "[1, 2]");
    }

    #[test]
    fn raises_returns_the_error() {
        let err = raises(|| "x".parse::<i32>()).unwrap();
        assert!(err.to_string().contains("invalid digit"));

        let violation = raises(|| "7".parse::<i32>()).unwrap_err();
        assert_eq!(violation.assertion, Assertion::Raises);
        assert_eq!(violation.actual, "Ok(7)");
    }

    #[test]
    fn boolean_checks() {
        assert!(is_true(true).is_ok());
        assert!(is_false(false).is_ok());
        assert!(is_some(&Some(1)).is_ok());
        assert_eq!(is_some::<i32>(&None).unwrap_err().actual, "None");
        assert_eq!(is_false(true).unwrap_err().message, "condition is true");
    }

    #[test]
    fn ensure_names_the_expression() {
        fn body() -> crate::UnitResult {
            let value = 3;
            ensure!(value > 5);
            Ok(())
        }
        match body() {
            Err(crate::UnitError::Assertion(violation)) => {
                assert_eq!(violation.expected, "`value > 5` to hold");
            }
            other => panic!("expected assertion violation, got {other:?}"),
        }
    }

    #[test]
    fn context_prefixes_message() {
        let violation = equals(1, 2).unwrap_err().context("status code");
        assert_eq!(violation.message, "status code: values differ");
    }
}
