//! ACL token records and the process-wide sentinel tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Accessor ID of the anonymous sentinel token.
pub const ANONYMOUS_ACCESSOR_ID: &str = "anonymous";

/// Accessor ID of the leader sentinel token.
pub const LEADER_ACCESSOR_ID: &str = "leader";

/// Name of the policy granted to anonymous requests.
pub const ANONYMOUS_POLICY_NAME: &str = "anonymous";

static ANONYMOUS_TOKEN: LazyLock<Arc<AclToken>> = LazyLock::new(|| {
    Arc::new(AclToken {
        accessor_id: ANONYMOUS_ACCESSOR_ID.to_string(),
        secret_id: String::new(),
        name: "Anonymous Token".to_string(),
        token_type: TokenType::Client,
        policies: vec![ANONYMOUS_POLICY_NAME.to_string()],
        roles: Vec::new(),
        global: false,
        create_time: DateTime::<Utc>::UNIX_EPOCH,
        expiration_time: None,
        create_index: 0,
        modify_index: 0,
    })
});

static LEADER_TOKEN: LazyLock<Arc<AclToken>> = LazyLock::new(|| {
    Arc::new(AclToken {
        accessor_id: LEADER_ACCESSOR_ID.to_string(),
        secret_id: String::new(),
        name: "Leader Token".to_string(),
        token_type: TokenType::Management,
        policies: Vec::new(),
        roles: Vec::new(),
        global: false,
        create_time: DateTime::<Utc>::UNIX_EPOCH,
        expiration_time: None,
        create_index: 0,
        modify_index: 0,
    })
});

/// Token privilege class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Privileges come from the token's policies and roles.
    Client,
    /// Unrestricted; policies and roles are ignored.
    Management,
}

/// Link from a token to an ACL role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclTokenRoleLink {
    pub id: String,

    /// Informational only; resolution goes by `id`.
    #[serde(default)]
    pub name: String,
}

/// A bearer credential record.
///
/// The `secret_id` is redacted in Debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclToken {
    /// Public identifier, safe to log.
    pub accessor_id: String,

    /// Bearer secret presented by callers.
    pub secret_id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Names of policies attached directly to the token.
    #[serde(default)]
    pub policies: Vec<String>,

    #[serde(default)]
    pub roles: Vec<AclTokenRoleLink>,

    #[serde(default)]
    pub global: bool,

    pub create_time: DateTime<Utc>,

    #[serde(default)]
    pub expiration_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub create_index: u64,

    #[serde(default)]
    pub modify_index: u64,
}

impl fmt::Debug for AclToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AclToken")
            .field("accessor_id", &self.accessor_id)
            .field("secret_id", &"[REDACTED]")
            .field("name", &self.name)
            .field("token_type", &self.token_type)
            .field("policies", &self.policies)
            .field("roles", &self.roles)
            .field("global", &self.global)
            .field("expiration_time", &self.expiration_time)
            .field("modify_index", &self.modify_index)
            .finish()
    }
}

impl AclToken {
    /// The token used for requests that present no secret while ACLs are
    /// enabled. Built once, shared, never mutated.
    pub fn anonymous() -> Arc<AclToken> {
        Arc::clone(&ANONYMOUS_TOKEN)
    }

    /// The management-equivalent identity of the elected leader's own
    /// internal requests. It is never stored in the state store.
    pub fn leader() -> Arc<AclToken> {
        Arc::clone(&LEADER_TOKEN)
    }

    /// Whether this is the anonymous sentinel itself. Compared by identity:
    /// a stored token that reuses the accessor ID is not the sentinel.
    pub fn is_anonymous(&self) -> bool {
        std::ptr::eq(self, Arc::as_ptr(&ANONYMOUS_TOKEN))
    }

    /// Whether this is the leader sentinel itself, by identity.
    pub fn is_leader(&self) -> bool {
        std::ptr::eq(self, Arc::as_ptr(&LEADER_TOKEN))
    }

    pub fn is_management(&self) -> bool {
        self.token_type == TokenType::Management
    }

    /// True when the token has an expiration strictly before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time.is_some_and(|expires| expires < now)
    }
}
