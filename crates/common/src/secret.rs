//! Secret types for protecting credentials from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for every credential that crosses
//! the control plane: ACL token secret IDs, node secret IDs, the leader's
//! internal ACL secret and signed workload identities.
//!
//! `SecretString` implements `Debug` with redaction, so a struct that derives
//! `Debug` and holds one is safe to log with `{:?}` or through `tracing`.
//! The value is zeroized on drop. Reading it requires an explicit
//! [`ExposeSecret::expose_secret`] call, which keeps every comparison
//! against a presented credential visible in review.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LeaderState {
//!     server_id: String,
//!     leader_acl: SecretString,
//! }
//!
//! let state = LeaderState {
//!     server_id: "server-1".to_string(),
//!     leader_acl: SecretString::from("0b5bb6a2-2c2e-4dbb-9a4f-6f8a1c3d2e10"),
//! };
//!
//! // The secret is redacted in debug output.
//! assert!(!format!("{state:?}").contains("0b5bb6a2"));
//!
//! // Comparisons go through expose_secret().
//! assert!(state.leader_acl.expose_secret().starts_with("0b5bb6a2"));
//! ```

pub use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

/// Returns true when `candidate` equals a non-empty `secret`.
///
/// An empty secret means "not configured" and never matches, not even an
/// empty candidate. The comparison runs in constant time over the bytes.
#[must_use]
pub fn matches_secret(secret: &SecretString, candidate: &str) -> bool {
    let expected = secret.expose_secret();
    !expected.is_empty() && bool::from(expected.as_bytes().ct_eq(candidate.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("7a1c0e52-3d5b-4b7e-8f2a-9c6d4e1b0a33");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("7a1c0e52"));
    }

    #[test]
    fn test_struct_with_secret_is_safe() {
        #[allow(dead_code)]
        #[derive(Debug)]
        struct NodeRegistration {
            node_id: String,
            secret_id: SecretString,
        }

        let reg = NodeRegistration {
            node_id: "node-a".to_string(),
            secret_id: SecretString::from("node-secret-value"),
        };

        let debug_str = format!("{reg:?}");

        assert!(debug_str.contains("node-a"));
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("node-secret-value"));
    }

    #[test]
    fn test_deserialize() {
        #[derive(Debug, Deserialize)]
        struct Bootstrap {
            secret_id: SecretString,
        }

        let json = r#"{"secret_id": "bootstrap-secret"}"#;
        let parsed: Bootstrap = serde_json::from_str(json).expect("deserialize");

        assert_eq!(parsed.secret_id.expose_secret(), "bootstrap-secret");
        assert!(!format!("{parsed:?}").contains("bootstrap-secret"));
    }

    #[test]
    fn test_matches_secret() {
        let secret = SecretString::from("leader-secret");
        assert!(matches_secret(&secret, "leader-secret"));
        assert!(!matches_secret(&secret, "other"));
        assert!(!matches_secret(&secret, ""));
    }

    #[test]
    fn test_matches_secret_rejects_near_misses() {
        let secret = SecretString::from("leader-secret");
        // Same length, last byte differs.
        assert!(!matches_secret(&secret, "leader-secreT"));
        assert!(!matches_secret(&secret, "leader-secre"));
        assert!(!matches_secret(&secret, "leader-secret "));
        assert!(!matches_secret(&secret, "LEADER-SECRET"));
    }

    #[test]
    fn test_empty_secret_never_matches() {
        let secret = SecretString::from("");
        assert!(!matches_secret(&secret, ""));
        assert!(!matches_secret(&secret, "anything"));
    }
}
