//! Common identifier helpers for control plane components.
//!
//! Cluster records (tokens, nodes, allocations) are keyed by UUID strings.
//! Secret identifiers presented by callers share that format, which lets the
//! resolution layer reject malformed secrets before touching the state store.

use uuid::Uuid;

/// Canonical length of a hyphenated UUID string.
pub const UUID_STRING_LEN: usize = 36;

/// Returns true when `value` is a canonical hyphenated UUID
/// (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).
///
/// The simple (no hyphen), braced and URN forms accepted by
/// [`Uuid::parse_str`] are rejected: secret identifiers are always issued in
/// hyphenated form, and anything else is some other kind of credential.
#[must_use]
pub fn is_uuid(value: &str) -> bool {
    value.len() == UUID_STRING_LEN && Uuid::try_parse(value).is_ok()
}

/// Generate a fresh secret or record identifier.
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
