//! Shared cache of compiled ACL objects.
//!
//! Entries are keyed by the identity of the input policy set, not by token
//! or workload: the SHA-256 of each distinct policy's name and modify index,
//! sorted by name. Editing a policy bumps its modify index, so the edited set
//! hashes to a new key and stale entries simply age out. Nothing is ever
//! invalidated explicitly.
//!
//! The backing `moka` cache is bounded and uses TinyLFU admission with LRU
//! eviction, so a burst of one-shot policy sets cannot flush the sets that
//! most requests share. Concurrent misses on one key are coalesced: one
//! caller compiles, the others wait and receive the same `Arc`.

use super::{Acl, AclError};
use crate::models::AclPolicy;
use moka::sync::Cache;
use ring::digest::{Context, SHA256};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of a deduplicated policy set.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolicySetKey([u8; 32]);

impl PolicySetKey {
    /// Key for `policies`, which must already be deduplicated by name.
    /// Input order does not matter.
    fn for_policies(policies: &[Arc<AclPolicy>]) -> Self {
        let mut sorted: Vec<&AclPolicy> = policies.iter().map(AsRef::as_ref).collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let mut ctx = Context::new(&SHA256);
        for policy in sorted {
            ctx.update(policy.name.as_bytes());
            // Separator keeps ("ab", 1) distinct from ("a", ...).
            ctx.update(&[0]);
            ctx.update(&policy.modify_index.to_be_bytes());
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(ctx.finish().as_ref());
        Self(key)
    }
}

impl fmt::Debug for PolicySetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolicySetKey({self})")
    }
}

impl fmt::Display for PolicySetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 8 bytes is plenty to tell entries apart in logs.
        let prefix = self.0.get(..8).unwrap_or(self.0.as_slice());
        f.write_str(&hex::encode(prefix))
    }
}

/// Hit/miss counters since the cache was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Bounded, thread-safe cache of compiled ACL objects.
///
/// Cheap to clone; clones share the same entries and counters.
#[derive(Clone)]
pub struct AclCache {
    entries: Cache<PolicySetKey, Arc<Acl>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl fmt::Debug for AclCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AclCache")
            .field("entries", &self.entries.entry_count())
            .field("stats", &self.stats())
            .finish()
    }
}

impl AclCache {
    /// Create a cache holding at most `capacity` compiled objects.
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Compile `policies` into an ACL, reusing a cached object for an equal
    /// policy set.
    ///
    /// Duplicate names are dropped (first occurrence wins). An empty set is
    /// [`Acl::deny_all`] and bypasses the cache.
    pub fn compile(&self, policies: &[Arc<AclPolicy>]) -> Result<Arc<Acl>, AclError> {
        let mut seen = HashSet::with_capacity(policies.len());
        let unique: Vec<Arc<AclPolicy>> = policies
            .iter()
            .filter(|policy| seen.insert(policy.name.as_str()))
            .cloned()
            .collect();

        if unique.is_empty() {
            return Ok(Acl::deny_all());
        }

        let key = PolicySetKey::for_policies(&unique);
        let mut compiled_here = false;

        let acl = self
            .entries
            .try_get_with(key, || {
                compiled_here = true;
                Acl::compile(&unique).map(Arc::new)
            })
            .map_err(|e| {
                tracing::warn!(target: "acl.cache", key = %key, error = %e, "ACL compilation failed");
                AclError::clone(&e)
            })?;

        if compiled_here {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                target: "acl.cache",
                key = %key,
                policy_count = unique.len(),
                "Compiled and cached ACL"
            );
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(target: "acl.cache", key = %key, "ACL cache hit");
        }

        Ok(acl)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of cached objects after pending maintenance has run.
    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}
