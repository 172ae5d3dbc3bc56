//! Test helpers for generating unique test data
//!
//! Unique strings are derived from ULIDs to keep test data isolated between
//! runs that share a database.

use ulid::Ulid;

/// Generate a unique string with the given prefix.
///
/// # Examples
/// ```
/// use backend_test_support::unique_helpers::unique_str;
///
/// let id1 = unique_str("player");
/// let id2 = unique_str("player");
/// assert_ne!(id1, id2);
/// assert!(id1.starts_with("player-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// Generate a unique chat identity with the given prefix.
///
/// # Examples
/// ```
/// use backend_test_support::unique_helpers::unique_external_id;
///
/// let a = unique_external_id("chat");
/// let b = unique_external_id("chat");
/// assert_ne!(a, b);
/// ```
pub fn unique_external_id(prefix: &str) -> String {
    format!("{}:{}", prefix, Ulid::new())
}
