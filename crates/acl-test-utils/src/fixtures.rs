//! Mock records and builders
//!
//! Provides fluent APIs for tokens and identity claims, and plain
//! constructors for the records the resolver reads.

use crate::test_ids::*;
use acl_resolver::auth::IdentityClaims;
use acl_resolver::models::{
    AclPolicy, AclRole, AclRolePolicyLink, AclToken, AclTokenRoleLink, AllocClientStatus,
    AllocDesiredStatus, Allocation, JobAcl, JobRef, Node, TokenType,
};
use chrono::{DateTime, Duration, Utc};

/// Policy document granting read on the `default` namespace.
pub const READ_DEFAULT_RULES: &str = r#"{"namespaces": {"default": {"policy": "read"}}}"#;

/// Policy document granting write on the `default` namespace.
pub const WRITE_DEFAULT_RULES: &str = r#"{"namespaces": {"default": {"policy": "write"}}}"#;

/// Policy document granting node read.
pub const NODE_READ_RULES: &str = r#"{"node": "read"}"#;

/// Builder for ACL token records
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::client(TEST_SECRET_CLIENT)
///     .with_policy("readonly")
///     .with_role(TEST_ROLE_ID)
///     .build();
/// ```
pub struct TestTokenBuilder {
    token: AclToken,
}

impl TestTokenBuilder {
    /// A client token with no policies.
    pub fn client(secret_id: &str) -> Self {
        Self {
            token: AclToken {
                accessor_id: format!("accessor-{secret_id}"),
                secret_id: secret_id.to_string(),
                name: "test client token".to_string(),
                token_type: TokenType::Client,
                policies: Vec::new(),
                roles: Vec::new(),
                global: false,
                create_time: Utc::now(),
                expiration_time: None,
                create_index: 0,
                modify_index: 0,
            },
        }
    }

    /// A management token.
    pub fn management(secret_id: &str) -> Self {
        let mut builder = Self::client(secret_id);
        builder.token.token_type = TokenType::Management;
        builder.token.name = "test management token".to_string();
        builder
    }

    pub fn accessor(mut self, accessor_id: &str) -> Self {
        self.token.accessor_id = accessor_id.to_string();
        self
    }

    pub fn with_policy(mut self, name: &str) -> Self {
        self.token.policies.push(name.to_string());
        self
    }

    pub fn with_role(mut self, role_id: &str) -> Self {
        self.token.roles.push(AclTokenRoleLink {
            id: role_id.to_string(),
            name: String::new(),
        });
        self
    }

    /// Set an absolute expiration time.
    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.token.expiration_time = Some(at);
        self
    }

    /// Set expiration in seconds from now (negative for the past).
    pub fn expires_in(self, seconds: i64) -> Self {
        self.expires_at(Utc::now() + Duration::seconds(seconds))
    }

    pub fn build(self) -> AclToken {
        self.token
    }
}

/// Builder for workload identity claims
///
/// Defaults to the mock allocation's ID and task, issued now and valid for
/// an hour.
pub struct IdentityClaimsBuilder {
    claims: IdentityClaims,
}

impl IdentityClaimsBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            claims: IdentityClaims {
                allocation_id: TEST_ALLOC_ID.to_string(),
                task: TEST_TASK.to_string(),
                namespace: TEST_NAMESPACE.to_string(),
                job_id: TEST_JOB_ID.to_string(),
                sub: format!(
                    "global:{TEST_NAMESPACE}:{TEST_JOB_ID}:{TEST_TASK_GROUP}:{TEST_TASK}:default"
                ),
                exp: (now + Duration::seconds(3600)).timestamp(),
                iat: now.timestamp(),
                nbf: None,
            },
        }
    }

    pub fn for_alloc(mut self, alloc_id: &str) -> Self {
        self.claims.allocation_id = alloc_id.to_string();
        self
    }

    pub fn for_task(mut self, task: &str) -> Self {
        self.claims.task = task.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for the past).
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.claims.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.claims.iat = timestamp;
        self
    }

    pub fn build(self) -> IdentityClaims {
        self.claims
    }
}

impl Default for IdentityClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A policy with no job selector.
pub fn mock_policy(name: &str, rules: &str) -> AclPolicy {
    AclPolicy {
        name: name.to_string(),
        description: format!("test policy {name}"),
        rules: rules.to_string(),
        job_acl: None,
        create_index: 0,
        modify_index: 0,
    }
}

/// A policy attached to the mock job, scoped by `group` and `task` (empty
/// for job or group scope).
pub fn mock_job_policy(name: &str, rules: &str, group: &str, task: &str) -> AclPolicy {
    AclPolicy {
        job_acl: Some(JobAcl {
            namespace: TEST_NAMESPACE.to_string(),
            job_id: TEST_JOB_ID.to_string(),
            group: group.to_string(),
            task: task.to_string(),
        }),
        ..mock_policy(name, rules)
    }
}

pub fn mock_role(id: &str, policies: &[&str]) -> AclRole {
    AclRole {
        id: id.to_string(),
        name: format!("role-{id}"),
        description: String::new(),
        policies: policies
            .iter()
            .map(|name| AclRolePolicyLink {
                name: name.to_string(),
            })
            .collect(),
        create_index: 0,
        modify_index: 0,
    }
}

/// A running allocation of the mock job's `web` group.
pub fn mock_alloc() -> Allocation {
    Allocation {
        id: TEST_ALLOC_ID.to_string(),
        namespace: TEST_NAMESPACE.to_string(),
        job: Some(JobRef {
            id: TEST_JOB_ID.to_string(),
            name: TEST_JOB_ID.to_string(),
        }),
        task_group: TEST_TASK_GROUP.to_string(),
        node_id: TEST_NODE_ID.to_string(),
        desired_status: AllocDesiredStatus::Run,
        client_status: AllocClientStatus::Running,
    }
}

/// The mock allocation moved to another task group.
pub fn mock_alloc_in_group(group: &str) -> Allocation {
    Allocation {
        task_group: group.to_string(),
        ..mock_alloc()
    }
}

/// A completed allocation of the mock job.
pub fn mock_terminal_alloc() -> Allocation {
    Allocation {
        id: TEST_ALLOC_ID_TERMINAL.to_string(),
        desired_status: AllocDesiredStatus::Stop,
        client_status: AllocClientStatus::Complete,
        ..mock_alloc()
    }
}

pub fn mock_node() -> Node {
    Node {
        id: TEST_NODE_ID.to_string(),
        secret_id: TEST_NODE_SECRET.to_string(),
        name: "test-node".to_string(),
        datacenter: "dc1".to_string(),
    }
}
