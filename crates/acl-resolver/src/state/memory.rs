//! In-process state store.
//!
//! Copy-on-write: the table set lives behind an `Arc` that writers replace
//! wholesale under a lock. Taking a snapshot clones the `Arc`, which makes
//! snapshots immutable and cheap. Used by tests and single-process
//! deployments; the replicated store implements the same traits.

use super::{StateSnapshot, StateStore, StoreError};
use crate::models::{AclPolicy, AclRole, AclToken, Allocation, Node};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default, Clone)]
struct Tables {
    index: u64,
    tokens_by_secret: HashMap<String, Arc<AclToken>>,
    policies: HashMap<String, Arc<AclPolicy>>,
    roles: HashMap<String, Arc<AclRole>>,
    allocs: HashMap<String, Arc<Allocation>>,
    nodes_by_secret: HashMap<String, Arc<Node>>,
}

/// Snapshot of an [`InMemoryStateStore`].
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    tables: Arc<Tables>,
}

impl StateSnapshot for MemorySnapshot {
    fn index(&self) -> u64 {
        self.tables.index
    }

    fn acl_token_by_secret_id(&self, secret_id: &str) -> Result<Option<Arc<AclToken>>, StoreError> {
        Ok(self.tables.tokens_by_secret.get(secret_id).cloned())
    }

    fn acl_policy_by_name(&self, name: &str) -> Result<Option<Arc<AclPolicy>>, StoreError> {
        Ok(self.tables.policies.get(name).cloned())
    }

    fn acl_policies_by_job(
        &self,
        namespace: &str,
        job_id: &str,
    ) -> Result<Vec<Arc<AclPolicy>>, StoreError> {
        let mut policies: Vec<Arc<AclPolicy>> = self
            .tables
            .policies
            .values()
            .filter(|policy| {
                policy
                    .job_acl
                    .as_ref()
                    .is_some_and(|sel| sel.namespace == namespace && sel.job_id == job_id)
            })
            .cloned()
            .collect();

        // Name order, like the store's secondary index.
        policies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(policies)
    }

    fn acl_role_by_id(&self, role_id: &str) -> Result<Option<Arc<AclRole>>, StoreError> {
        Ok(self.tables.roles.get(role_id).cloned())
    }

    fn alloc_by_id(&self, alloc_id: &str) -> Result<Option<Arc<Allocation>>, StoreError> {
        Ok(self.tables.allocs.get(alloc_id).cloned())
    }

    fn node_by_secret_id(&self, secret_id: &str) -> Result<Option<Arc<Node>>, StoreError> {
        Ok(self.tables.nodes_by_secret.get(secret_id).cloned())
    }
}

/// Copy-on-write in-memory implementation of [`StateStore`].
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    tables: RwLock<Arc<Tables>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one write transaction and return its index.
    fn commit<F>(&self, apply: F) -> Result<u64, StoreError>
    where
        F: FnOnce(&mut Tables, u64),
    {
        let mut guard = self.tables.write().map_err(|_| {
            tracing::error!(target: "acl.state", "State store lock poisoned on write");
            StoreError::Poisoned
        })?;

        let mut next = Tables::clone(&guard);
        let index = next.index + 1;
        apply(&mut next, index);
        next.index = index;
        *guard = Arc::new(next);

        tracing::trace!(target: "acl.state", index = index, "Committed state write");
        Ok(index)
    }

    /// Insert or replace a token, keyed by its secret ID.
    ///
    /// Create/modify indexes are assigned by the store.
    pub fn upsert_acl_token(&self, mut token: AclToken) -> Result<u64, StoreError> {
        self.commit(|tables, index| {
            let existing = tables
                .tokens_by_secret
                .values()
                .find(|t| t.accessor_id == token.accessor_id)
                .cloned();
            if let Some(existing) = existing {
                tables.tokens_by_secret.remove(&existing.secret_id);
                token.create_index = existing.create_index;
            } else {
                token.create_index = index;
            }
            token.modify_index = index;
            tables
                .tokens_by_secret
                .insert(token.secret_id.clone(), Arc::new(token));
        })
    }

    pub fn delete_acl_token(&self, accessor_id: &str) -> Result<u64, StoreError> {
        self.commit(|tables, _| {
            tables
                .tokens_by_secret
                .retain(|_, t| t.accessor_id != accessor_id);
        })
    }

    /// Insert or replace a policy by name. Every write bumps `modify_index`,
    /// which changes the cache key of any policy set containing it.
    pub fn upsert_acl_policy(&self, mut policy: AclPolicy) -> Result<u64, StoreError> {
        self.commit(|tables, index| {
            policy.create_index = tables
                .policies
                .get(&policy.name)
                .map_or(index, |p| p.create_index);
            policy.modify_index = index;
            tables.policies.insert(policy.name.clone(), Arc::new(policy));
        })
    }

    pub fn delete_acl_policy(&self, name: &str) -> Result<u64, StoreError> {
        self.commit(|tables, _| {
            tables.policies.remove(name);
        })
    }

    pub fn upsert_acl_role(&self, mut role: AclRole) -> Result<u64, StoreError> {
        self.commit(|tables, index| {
            role.create_index = tables
                .roles
                .get(&role.id)
                .map_or(index, |r| r.create_index);
            role.modify_index = index;
            tables.roles.insert(role.id.clone(), Arc::new(role));
        })
    }

    pub fn delete_acl_role(&self, role_id: &str) -> Result<u64, StoreError> {
        self.commit(|tables, _| {
            tables.roles.remove(role_id);
        })
    }

    pub fn upsert_allocation(&self, alloc: Allocation) -> Result<u64, StoreError> {
        self.commit(|tables, _| {
            tables.allocs.insert(alloc.id.clone(), Arc::new(alloc));
        })
    }

    pub fn upsert_node(&self, node: Node) -> Result<u64, StoreError> {
        self.commit(|tables, _| {
            tables.nodes_by_secret.retain(|_, n| n.id != node.id);
            tables
                .nodes_by_secret
                .insert(node.secret_id.clone(), Arc::new(node));
        })
    }
}

impl StateStore for InMemoryStateStore {
    fn snapshot(&self) -> Result<Arc<dyn StateSnapshot>, StoreError> {
        let guard = self.tables.read().map_err(|_| {
            tracing::error!(target: "acl.state", "State store lock poisoned on snapshot");
            StoreError::Poisoned
        })?;

        Ok(Arc::new(MemorySnapshot {
            tables: Arc::clone(&guard),
        }))
    }
}
