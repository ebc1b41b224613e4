//! State store wrappers for observing and breaking resolution
//!
//! `InstrumentedStore` counts snapshots and lookups so tests can assert that
//! a path never touched state. `FailingStore` returns a store error on every
//! call.

use acl_resolver::models::{AclPolicy, AclRole, AclToken, Allocation, Node};
use acl_resolver::state::{InMemoryStateStore, StateSnapshot, StateStore, StoreError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lookup counters shared by a store and all of its snapshots.
#[derive(Debug, Default)]
pub struct LookupCounts {
    pub snapshots: AtomicU64,
    pub token_lookups: AtomicU64,
    pub policy_lookups: AtomicU64,
    pub job_policy_lookups: AtomicU64,
    pub role_lookups: AtomicU64,
    pub alloc_lookups: AtomicU64,
    pub node_lookups: AtomicU64,
}

impl LookupCounts {
    pub fn snapshots(&self) -> u64 {
        self.snapshots.load(Ordering::SeqCst)
    }

    pub fn token_lookups(&self) -> u64 {
        self.token_lookups.load(Ordering::SeqCst)
    }

    /// Lookups of policies by name or by job.
    pub fn policy_lookups(&self) -> u64 {
        self.policy_lookups.load(Ordering::SeqCst) + self.job_policy_lookups.load(Ordering::SeqCst)
    }

    pub fn role_lookups(&self) -> u64 {
        self.role_lookups.load(Ordering::SeqCst)
    }

    pub fn alloc_lookups(&self) -> u64 {
        self.alloc_lookups.load(Ordering::SeqCst)
    }

    pub fn node_lookups(&self) -> u64 {
        self.node_lookups.load(Ordering::SeqCst)
    }

    /// Every lookup of any kind.
    pub fn total_lookups(&self) -> u64 {
        self.token_lookups()
            + self.policy_lookups()
            + self.role_lookups()
            + self.alloc_lookups()
            + self.node_lookups()
    }

    /// Whether the store was touched at all.
    pub fn untouched(&self) -> bool {
        self.snapshots() == 0 && self.total_lookups() == 0
    }
}

/// An [`InMemoryStateStore`] that counts every access.
pub struct InstrumentedStore {
    inner: Arc<InMemoryStateStore>,
    counts: Arc<LookupCounts>,
}

impl InstrumentedStore {
    pub fn new(inner: Arc<InMemoryStateStore>) -> Self {
        Self {
            inner,
            counts: Arc::new(LookupCounts::default()),
        }
    }

    pub fn counts(&self) -> Arc<LookupCounts> {
        Arc::clone(&self.counts)
    }
}

impl StateStore for InstrumentedStore {
    fn snapshot(&self) -> Result<Arc<dyn StateSnapshot>, StoreError> {
        self.counts.snapshots.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InstrumentedSnapshot {
            inner: self.inner.snapshot()?,
            counts: Arc::clone(&self.counts),
        }))
    }
}

struct InstrumentedSnapshot {
    inner: Arc<dyn StateSnapshot>,
    counts: Arc<LookupCounts>,
}

impl StateSnapshot for InstrumentedSnapshot {
    fn index(&self) -> u64 {
        self.inner.index()
    }

    fn acl_token_by_secret_id(&self, secret_id: &str) -> Result<Option<Arc<AclToken>>, StoreError> {
        self.counts.token_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.acl_token_by_secret_id(secret_id)
    }

    fn acl_policy_by_name(&self, name: &str) -> Result<Option<Arc<AclPolicy>>, StoreError> {
        self.counts.policy_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.acl_policy_by_name(name)
    }

    fn acl_policies_by_job(
        &self,
        namespace: &str,
        job_id: &str,
    ) -> Result<Vec<Arc<AclPolicy>>, StoreError> {
        self.counts.job_policy_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.acl_policies_by_job(namespace, job_id)
    }

    fn acl_role_by_id(&self, role_id: &str) -> Result<Option<Arc<AclRole>>, StoreError> {
        self.counts.role_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.acl_role_by_id(role_id)
    }

    fn alloc_by_id(&self, alloc_id: &str) -> Result<Option<Arc<Allocation>>, StoreError> {
        self.counts.alloc_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.alloc_by_id(alloc_id)
    }

    fn node_by_secret_id(&self, secret_id: &str) -> Result<Option<Arc<Node>>, StoreError> {
        self.counts.node_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.node_by_secret_id(secret_id)
    }
}

/// Which calls a [`FailingStore`] breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// `snapshot()` itself fails.
    Snapshot,
    /// Snapshots succeed but every lookup fails.
    Lookups,
}

/// A store that is always broken.
#[derive(Debug, Clone, Copy)]
pub struct FailingStore {
    mode: FailureMode,
}

impl FailingStore {
    pub fn new(mode: FailureMode) -> Self {
        Self { mode }
    }
}

impl StateStore for FailingStore {
    fn snapshot(&self) -> Result<Arc<dyn StateSnapshot>, StoreError> {
        match self.mode {
            FailureMode::Snapshot => Err(StoreError::Poisoned),
            FailureMode::Lookups => Ok(Arc::new(FailingSnapshot)),
        }
    }
}

struct FailingSnapshot;

fn corrupted<T>() -> Result<T, StoreError> {
    Err(StoreError::Corrupted("injected failure".to_string()))
}

impl StateSnapshot for FailingSnapshot {
    fn index(&self) -> u64 {
        0
    }

    fn acl_token_by_secret_id(&self, _: &str) -> Result<Option<Arc<AclToken>>, StoreError> {
        corrupted()
    }

    fn acl_policy_by_name(&self, _: &str) -> Result<Option<Arc<AclPolicy>>, StoreError> {
        corrupted()
    }

    fn acl_policies_by_job(&self, _: &str, _: &str) -> Result<Vec<Arc<AclPolicy>>, StoreError> {
        corrupted()
    }

    fn acl_role_by_id(&self, _: &str) -> Result<Option<Arc<AclRole>>, StoreError> {
        corrupted()
    }

    fn alloc_by_id(&self, _: &str) -> Result<Option<Arc<Allocation>>, StoreError> {
        corrupted()
    }

    fn node_by_secret_id(&self, _: &str) -> Result<Option<Arc<Node>>, StoreError> {
        corrupted()
    }
}
