//! ACL policy and role records.

use serde::{Deserialize, Serialize};

/// Scopes a policy to a job, task group or task for workload identities.
///
/// An empty `group` means the whole job; an empty `task` (with a group set)
/// means the whole group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAcl {
    pub namespace: String,
    pub job_id: String,

    #[serde(default)]
    pub group: String,

    #[serde(default)]
    pub task: String,
}

/// A named policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclPolicy {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Serialized policy document, parsed when compiled.
    pub rules: String,

    /// Present only on policies attached to workloads.
    #[serde(default)]
    pub job_acl: Option<JobAcl>,

    #[serde(default)]
    pub create_index: u64,

    #[serde(default)]
    pub modify_index: u64,
}

/// Link from a role to a policy, by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRolePolicyLink {
    pub name: String,
}

/// A named collection of policy links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRole {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub policies: Vec<AclRolePolicyLink>,

    #[serde(default)]
    pub create_index: u64,

    #[serde(default)]
    pub modify_index: u64,
}

impl AclRole {
    /// Names of the policies linked from this role, in link order.
    pub fn policy_names(&self) -> impl Iterator<Item = &str> {
        self.policies.iter().map(|link| link.name.as_str())
    }
}
