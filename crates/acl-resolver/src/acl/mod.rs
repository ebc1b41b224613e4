//! Compiled ACL objects.
//!
//! An [`Acl`] is the immutable result of merging an ordered set of policy
//! documents. It is a pure function of that set, which is what makes it safe
//! to share through [`AclCache`] across requests and tokens.
//!
//! # Components
//!
//! - `policy` - policy document format and capability names
//! - `cache` - bounded concurrent cache keyed by policy-set identity

pub mod cache;
pub mod policy;

use crate::errors::AuthError;
use crate::models::{AclPolicy, AclToken};
use crate::state::StateSnapshot;
use policy::{PolicyDocument, PolicyLevel, CAP_DENY};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tracing::instrument;

pub use cache::{AclCache, CacheStats, PolicySetKey};

/// Namespace key whose rule applies to namespaces without an exact rule.
pub const WILDCARD_NAMESPACE: &str = "*";

static MANAGEMENT_ACL: LazyLock<Arc<Acl>> = LazyLock::new(|| {
    Arc::new(Acl {
        management: true,
        ..Acl::empty()
    })
});

static DENY_ALL_ACL: LazyLock<Arc<Acl>> = LazyLock::new(|| Arc::new(Acl::empty()));

/// Errors raised while compiling a policy set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AclError {
    #[error("failed to parse policy {policy}: {reason}")]
    Parse { policy: String, reason: String },

    #[error("policy {policy} grants unknown capability {capability}")]
    UnknownCapability { policy: String, capability: String },
}

/// An immutable capability-evaluation object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acl {
    management: bool,
    namespaces: HashMap<String, BTreeSet<String>>,
    node: Option<PolicyLevel>,
    agent: Option<PolicyLevel>,
    operator: Option<PolicyLevel>,
}

impl Acl {
    fn empty() -> Self {
        Self {
            management: false,
            namespaces: HashMap::new(),
            node: None,
            agent: None,
            operator: None,
        }
    }

    /// The unrestricted ACL held by management tokens and the leader.
    pub fn management() -> Arc<Acl> {
        Arc::clone(&MANAGEMENT_ACL)
    }

    /// The ACL that allows nothing.
    pub fn deny_all() -> Arc<Acl> {
        Arc::clone(&DENY_ALL_ACL)
    }

    /// Merge `policies` in order into one ACL.
    ///
    /// Namespace capabilities are unioned; a `deny` on a namespace from any
    /// policy removes everything else on it. Coarse levels merge with
    /// [`PolicyLevel::merge`].
    pub fn compile(policies: &[Arc<AclPolicy>]) -> Result<Acl, AclError> {
        let mut acl = Acl::empty();

        for policy in policies {
            let doc = PolicyDocument::parse(&policy.rules).map_err(|e| AclError::Parse {
                policy: policy.name.clone(),
                reason: e.to_string(),
            })?;

            if let Some(capability) = doc.unknown_capability() {
                return Err(AclError::UnknownCapability {
                    policy: policy.name.clone(),
                    capability: capability.to_string(),
                });
            }

            for (namespace, rule) in &doc.namespaces {
                let caps = acl.namespaces.entry(namespace.clone()).or_default();
                caps.extend(rule.expanded_capabilities().map(str::to_string));
            }

            acl.node = PolicyLevel::merge(acl.node, doc.node);
            acl.agent = PolicyLevel::merge(acl.agent, doc.agent);
            acl.operator = PolicyLevel::merge(acl.operator, doc.operator);
        }

        for caps in acl.namespaces.values_mut() {
            if caps.contains(CAP_DENY) {
                caps.retain(|cap| cap == CAP_DENY);
            }
        }

        Ok(acl)
    }

    pub fn is_management(&self) -> bool {
        self.management
    }

    /// Whether `capability` is granted on `namespace`.
    pub fn allow_namespace_operation(&self, namespace: &str, capability: &str) -> bool {
        if self.management {
            return true;
        }
        let caps = self
            .namespaces
            .get(namespace)
            .or_else(|| self.namespaces.get(WILDCARD_NAMESPACE));
        caps.is_some_and(|caps| !caps.contains(CAP_DENY) && caps.contains(capability))
    }

    pub fn allow_node_read(&self) -> bool {
        self.management || allows_read(self.node)
    }

    pub fn allow_node_write(&self) -> bool {
        self.management || self.node == Some(PolicyLevel::Write)
    }

    pub fn allow_agent_read(&self) -> bool {
        self.management || allows_read(self.agent)
    }

    pub fn allow_agent_write(&self) -> bool {
        self.management || self.agent == Some(PolicyLevel::Write)
    }

    pub fn allow_operator_read(&self) -> bool {
        self.management || allows_read(self.operator)
    }

    pub fn allow_operator_write(&self) -> bool {
        self.management || self.operator == Some(PolicyLevel::Write)
    }
}

fn allows_read(level: Option<PolicyLevel>) -> bool {
    matches!(level, Some(PolicyLevel::Read | PolicyLevel::Write))
}

/// Compile the ACL granted by `token` against `snap`.
///
/// Management tokens get [`Acl::management`] without any policy lookup.
/// Otherwise the effective policy set is the token's named policies followed
/// by the policies of each linked role, compiled through `cache`.
///
/// Dangling references are skipped on purpose: a policy or role that no
/// longer exists grants nothing, and deleting one must not break the tokens
/// that still point at it. Only store failures are errors.
#[instrument(skip_all, fields(accessor_id = %token.accessor_id))]
pub fn resolve_acl_from_token(
    snap: &dyn StateSnapshot,
    cache: &AclCache,
    token: &AclToken,
) -> Result<Arc<Acl>, AuthError> {
    if token.is_management() {
        return Ok(Acl::management());
    }

    let mut policies: Vec<Arc<AclPolicy>> =
        Vec::with_capacity(token.policies.len() + token.roles.len());

    for name in &token.policies {
        match snap.acl_policy_by_name(name)? {
            Some(policy) => policies.push(policy),
            None => {
                tracing::debug!(target: "acl.token", policy = %name, "Skipping missing policy");
            }
        }
    }

    for link in &token.roles {
        let Some(role) = snap.acl_role_by_id(&link.id)? else {
            tracing::debug!(target: "acl.token", role_id = %link.id, "Skipping missing role");
            continue;
        };

        for name in role.policy_names() {
            match snap.acl_policy_by_name(name)? {
                Some(policy) => policies.push(policy),
                None => {
                    tracing::debug!(
                        target: "acl.token",
                        role_id = %role.id,
                        policy = %name,
                        "Skipping missing role policy"
                    );
                }
            }
        }
    }

    Ok(cache.compile(&policies)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::policy::{CAP_LIST_JOBS, CAP_READ_JOB, CAP_READ_LOGS, CAP_SUBMIT_JOB};
    use super::*;

    fn policy(name: &str, rules: &str) -> Arc<AclPolicy> {
        Arc::new(AclPolicy {
            name: name.to_string(),
            description: String::new(),
            rules: rules.to_string(),
            job_acl: None,
            create_index: 1,
            modify_index: 1,
        })
    }

    #[test]
    fn test_management_allows_everything() {
        let acl = Acl::management();
        assert!(acl.is_management());
        assert!(acl.allow_namespace_operation("any", CAP_SUBMIT_JOB));
        assert!(acl.allow_node_write());
        assert!(acl.allow_operator_write());
    }

    #[test]
    fn test_deny_all_allows_nothing() {
        let acl = Acl::deny_all();
        assert!(!acl.is_management());
        assert!(!acl.allow_namespace_operation("default", CAP_LIST_JOBS));
        assert!(!acl.allow_node_read());
        assert!(!acl.allow_agent_read());
        assert!(!acl.allow_operator_read());
    }

    #[test]
    fn test_compile_empty_set_equals_deny_all() {
        let acl = Acl::compile(&[]).unwrap();
        assert_eq!(&acl, Acl::deny_all().as_ref());
    }

    #[test]
    fn test_compile_unions_namespace_capabilities() {
        let acl = Acl::compile(&[
            policy("reader", r#"{"namespaces": {"default": {"policy": "read"}}}"#),
            policy(
                "logs",
                r#"{"namespaces": {"default": {"capabilities": ["read-logs"]}}}"#,
            ),
        ])
        .unwrap();

        assert!(acl.allow_namespace_operation("default", CAP_READ_JOB));
        assert!(acl.allow_namespace_operation("default", CAP_READ_LOGS));
        assert!(!acl.allow_namespace_operation("default", CAP_SUBMIT_JOB));
        assert!(!acl.allow_namespace_operation("prod", CAP_READ_JOB));
    }

    #[test]
    fn test_namespace_deny_overrides_grants() {
        let acl = Acl::compile(&[
            policy("writer", r#"{"namespaces": {"prod": {"policy": "write"}}}"#),
            policy("blocker", r#"{"namespaces": {"prod": {"policy": "deny"}}}"#),
        ])
        .unwrap();

        assert!(!acl.allow_namespace_operation("prod", CAP_READ_JOB));
    }

    #[test]
    fn test_wildcard_namespace_applies_without_exact_rule() {
        let acl = Acl::compile(&[policy(
            "wild",
            r#"{"namespaces": {"*": {"policy": "read"}, "secret": {"policy": "deny"}}}"#,
        )])
        .unwrap();

        assert!(acl.allow_namespace_operation("anything", CAP_READ_JOB));
        assert!(!acl.allow_namespace_operation("secret", CAP_READ_JOB));
    }

    #[test]
    fn test_coarse_levels_merge() {
        let acl = Acl::compile(&[
            policy("a", r#"{"node": "read", "agent": "write", "operator": "write"}"#),
            policy("b", r#"{"node": "write", "operator": "deny"}"#),
        ])
        .unwrap();

        assert!(acl.allow_node_write());
        assert!(acl.allow_agent_write());
        assert!(!acl.allow_operator_read());
    }

    #[test]
    fn test_compile_reports_parse_errors() {
        let err = Acl::compile(&[policy("broken", "{not json")]).unwrap_err();
        assert!(matches!(err, AclError::Parse { ref policy, .. } if policy == "broken"));
    }

    #[test]
    fn test_compile_rejects_unknown_capability() {
        let err = Acl::compile(&[policy(
            "odd",
            r#"{"namespaces": {"default": {"capabilities": ["teleport"]}}}"#,
        )])
        .unwrap_err();
        assert_eq!(
            err,
            AclError::UnknownCapability {
                policy: "odd".to_string(),
                capability: "teleport".to_string()
            }
        );
    }
}
