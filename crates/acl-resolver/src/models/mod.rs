//! Records read by the resolution layer.
//!
//! These mirror the replicated state store's tables, trimmed to the fields
//! identity resolution and ACL compilation need. Nothing in this crate
//! mutates them; they are created and rotated by administrative operations.

mod alloc;
mod identity;
mod policy;
mod token;

pub use alloc::{AllocClientStatus, AllocDesiredStatus, Allocation, JobRef, Node};
pub use identity::AuthenticatedIdentity;
pub use policy::{AclPolicy, AclRole, AclRolePolicyLink, JobAcl};
pub use token::{
    AclToken, AclTokenRoleLink, TokenType, ANONYMOUS_ACCESSOR_ID, ANONYMOUS_POLICY_NAME,
    LEADER_ACCESSOR_ID,
};
