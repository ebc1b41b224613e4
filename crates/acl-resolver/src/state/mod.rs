//! Read access to replicated cluster state.
//!
//! Resolution never reads the live store. Each operation first takes a
//! [`StateSnapshot`], an immutable point-in-time view, and performs every
//! lookup against it, so a single resolution sees one consistent version of
//! tokens, roles, policies and allocations even while writers commit.
//!
//! Lookups return `Ok(None)` for absent records. `Err` means the store itself
//! is broken and is propagated to the caller.

pub mod memory;

use crate::models::{AclPolicy, AclRole, AclToken, Allocation, Node};
use std::sync::Arc;
use thiserror::Error;

pub use memory::InMemoryStateStore;

/// Errors raised by the state store, not by the records it holds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("state store lock poisoned")]
    Poisoned,

    #[error("state store corrupted: {0}")]
    Corrupted(String),
}

/// An immutable, point-in-time view of cluster state.
pub trait StateSnapshot: Send + Sync {
    /// Raft index the snapshot was taken at.
    fn index(&self) -> u64;

    fn acl_token_by_secret_id(&self, secret_id: &str) -> Result<Option<Arc<AclToken>>, StoreError>;

    fn acl_policy_by_name(&self, name: &str) -> Result<Option<Arc<AclPolicy>>, StoreError>;

    /// Policies whose `job_acl` selector targets `namespace`/`job_id`.
    /// Policies without a selector are never returned.
    fn acl_policies_by_job(
        &self,
        namespace: &str,
        job_id: &str,
    ) -> Result<Vec<Arc<AclPolicy>>, StoreError>;

    fn acl_role_by_id(&self, role_id: &str) -> Result<Option<Arc<AclRole>>, StoreError>;

    fn alloc_by_id(&self, alloc_id: &str) -> Result<Option<Arc<Allocation>>, StoreError>;

    fn node_by_secret_id(&self, secret_id: &str) -> Result<Option<Arc<Node>>, StoreError>;
}

/// Source of snapshots.
pub trait StateStore: Send + Sync {
    fn snapshot(&self) -> Result<Arc<dyn StateSnapshot>, StoreError>;
}
