//! Collision-free identities so tests sharing a store never see each
//! other's receipts.

use ulid::Ulid;

/// `{prefix}-{ulid}`, usable as a Google subject id.
///
/// ```
/// use raseed_test_support::unique_helpers::unique_sub;
///
/// let a = unique_sub("user");
/// assert_ne!(a, unique_sub("user"));
/// assert!(a.starts_with("user-"));
/// ```
pub fn unique_sub(prefix: &str) -> String {
    format!("{prefix}-{}", Ulid::new())
}

/// `{prefix}-{ulid}@example.test`
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.test", Ulid::new().to_string().to_lowercase())
}
