//! Resolver service.
//!
//! [`AclResolver`] is the only entry point RPC handlers use. It is cheap to
//! clone and safe to share; every operation takes its own state snapshot.
//!
//! # Components
//!
//! - `authenticate` - secret and transport facts to an identity
//! - `token` - secret to token, token to compiled ACL
//! - `claims` - workload identity verification and claims to compiled ACL

mod authenticate;
mod claims;
mod token;

use crate::acl::AclCache;
use crate::auth::ClaimVerifier;
use crate::config::Config;
use crate::errors::AuthError;
use crate::leader::LeaderAclReceiver;
use crate::state::{StateSnapshot, StateStore};
use std::fmt;
use std::sync::Arc;

/// Identity resolution and ACL compilation over a state store.
///
/// Operations that produce a token or ACL return `Ok(None)` when ACL
/// enforcement is disabled, which callers treat as "allow".
#[derive(Clone)]
pub struct AclResolver {
    config: Arc<Config>,
    state: Arc<dyn StateStore>,
    cache: AclCache,
    verifier: Arc<dyn ClaimVerifier>,
    leader_acl: LeaderAclReceiver,
}

impl fmt::Debug for AclResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AclResolver")
            .field("acl_enabled", &self.config.acl_enabled)
            .field("region", &self.config.region)
            .field("cache", &self.cache)
            .field("leader_acl", &self.leader_acl)
            .finish_non_exhaustive()
    }
}

impl AclResolver {
    /// Create a resolver with a fresh cache sized from `config`.
    pub fn new(
        config: Config,
        state: Arc<dyn StateStore>,
        verifier: Arc<dyn ClaimVerifier>,
        leader_acl: LeaderAclReceiver,
    ) -> Self {
        let cache = AclCache::new(config.acl_cache_capacity);
        Self::with_cache(config, state, cache, verifier, leader_acl)
    }

    /// Create a resolver sharing an existing cache.
    pub fn with_cache(
        config: Config,
        state: Arc<dyn StateStore>,
        cache: AclCache,
        verifier: Arc<dyn ClaimVerifier>,
        leader_acl: LeaderAclReceiver,
    ) -> Self {
        tracing::info!(
            target: "acl.authenticate",
            acl_enabled = config.acl_enabled,
            cache_capacity = config.acl_cache_capacity,
            region = %config.region,
            "ACL resolver initialized"
        );

        Self {
            config: Arc::new(config),
            state,
            cache,
            verifier,
            leader_acl,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &AclCache {
        &self.cache
    }

    fn acl_enabled(&self) -> bool {
        self.config.acl_enabled
    }

    fn snapshot(&self) -> Result<Arc<dyn StateSnapshot>, AuthError> {
        self.state.snapshot().map_err(|e| {
            tracing::error!(target: "acl.state", error = %e, "Failed to snapshot state");
            AuthError::from(e)
        })
    }
}
