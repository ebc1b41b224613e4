//! Policy document parsing.
//!
//! Policies are stored as serialized JSON documents and parsed only when a
//! policy set is compiled:
//!
//! ```json
//! {
//!   "namespaces": {
//!     "default": { "policy": "write" },
//!     "*":       { "capabilities": ["list-jobs"] }
//!   },
//!   "node": "read",
//!   "operator": "deny"
//! }
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;

/// Capability that removes every other capability on a namespace.
pub const CAP_DENY: &str = "deny";

pub const CAP_LIST_JOBS: &str = "list-jobs";
pub const CAP_PARSE_JOB: &str = "parse-job";
pub const CAP_READ_JOB: &str = "read-job";
pub const CAP_SUBMIT_JOB: &str = "submit-job";
pub const CAP_DISPATCH_JOB: &str = "dispatch-job";
pub const CAP_READ_LOGS: &str = "read-logs";
pub const CAP_READ_FS: &str = "read-fs";
pub const CAP_ALLOC_EXEC: &str = "alloc-exec";
pub const CAP_ALLOC_LIFECYCLE: &str = "alloc-lifecycle";

/// Every capability a namespace rule may grant.
pub const KNOWN_CAPABILITIES: &[&str] = &[
    CAP_DENY,
    CAP_LIST_JOBS,
    CAP_PARSE_JOB,
    CAP_READ_JOB,
    CAP_SUBMIT_JOB,
    CAP_DISPATCH_JOB,
    CAP_READ_LOGS,
    CAP_READ_FS,
    CAP_ALLOC_EXEC,
    CAP_ALLOC_LIFECYCLE,
];

const READ_CAPABILITIES: &[&str] = &[CAP_LIST_JOBS, CAP_PARSE_JOB, CAP_READ_JOB];

const WRITE_CAPABILITIES: &[&str] = &[
    CAP_LIST_JOBS,
    CAP_PARSE_JOB,
    CAP_READ_JOB,
    CAP_SUBMIT_JOB,
    CAP_DISPATCH_JOB,
    CAP_READ_LOGS,
    CAP_READ_FS,
    CAP_ALLOC_EXEC,
    CAP_ALLOC_LIFECYCLE,
];

/// Coarse access level for a non-namespaced resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyLevel {
    Deny,
    Read,
    Write,
}

impl PolicyLevel {
    /// Combine two grants from different policies. Deny wins, otherwise the
    /// higher level wins.
    pub fn merge(current: Option<PolicyLevel>, next: Option<PolicyLevel>) -> Option<PolicyLevel> {
        match (current, next) {
            (Some(PolicyLevel::Deny), _) | (_, Some(PolicyLevel::Deny)) => Some(PolicyLevel::Deny),
            (a, b) => a.max(b),
        }
    }

    /// Capabilities implied by this level on a namespace.
    pub fn namespace_capabilities(self) -> &'static [&'static str] {
        match self {
            PolicyLevel::Deny => &[CAP_DENY],
            PolicyLevel::Read => READ_CAPABILITIES,
            PolicyLevel::Write => WRITE_CAPABILITIES,
        }
    }
}

/// Rule for one namespace (or `*`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceRule {
    #[serde(default)]
    pub policy: Option<PolicyLevel>,

    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl NamespaceRule {
    /// Explicit capabilities plus those implied by the `policy` shorthand.
    pub fn expanded_capabilities(&self) -> impl Iterator<Item = &str> {
        self.policy
            .map(PolicyLevel::namespace_capabilities)
            .unwrap_or_default()
            .iter()
            .copied()
            .chain(self.capabilities.iter().map(String::as_str))
    }
}

/// A parsed policy document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceRule>,

    #[serde(default)]
    pub node: Option<PolicyLevel>,

    #[serde(default)]
    pub agent: Option<PolicyLevel>,

    #[serde(default)]
    pub operator: Option<PolicyLevel>,
}

impl PolicyDocument {
    /// Parse a serialized document. An empty or whitespace-only document is
    /// an empty policy.
    pub fn parse(rules: &str) -> Result<Self, serde_json::Error> {
        if rules.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(rules)
    }

    /// First capability that is not in [`KNOWN_CAPABILITIES`], if any.
    pub fn unknown_capability(&self) -> Option<&str> {
        self.namespaces
            .values()
            .flat_map(|rule| rule.capabilities.iter())
            .map(String::as_str)
            .find(|cap| !KNOWN_CAPABILITIES.contains(cap))
    }
}
