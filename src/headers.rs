//! Header name canonicalization.
//!
//! Header names arrive from callers in whatever casing they were typed in,
//! so before user-supplied headers are merged into a request they are
//! rewritten into Train-Case (`x-publishable-api-key` becomes
//! `X-Publishable-Api-Key`). Values are never touched.

use serde_json::{Map, Value};

/// A composed set of request headers.
///
/// Built fresh for every request and discarded after dispatch; header sets
/// are never shared between requests because generated values such as the
/// idempotency key must be unique per attempt.
pub type HeaderSet = Map<String, Value>;

/// Canonicalize a single header name into Train-Case.
///
/// Splits on `-`, uppercases the first character of each segment and
/// lowercases the remainder, then rejoins. Empty segments (consecutive
/// dashes) pass through unchanged.
///
/// # Example
/// ```
/// use medusa_client::headers::normalize_header_name;
///
/// assert_eq!(
///     normalize_header_name("x-medusa-access-token"),
///     "X-Medusa-Access-Token"
/// );
/// ```
pub fn normalize_header_name(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Canonicalize every key of a header mapping, preserving values verbatim.
///
/// Non-object inputs (null, strings, numbers, arrays) are returned
/// unchanged. This mirrors how callers may hand over arbitrary JSON for
/// their headers; a non-mapping is a defined no-op, not an error.
pub fn normalize_headers(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(name, v)| (normalize_header_name(name), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}
