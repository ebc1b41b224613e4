//! Resolver test harness
//!
//! Wires an [`AclResolver`] to an instrumented in-memory store, a keyring
//! trusting one deterministic signing key, and a leader ACL channel.

use crate::crypto_fixtures::{test_signing_key, TestSigningKey};
use crate::instrumented_store::{InstrumentedStore, LookupCounts};
use crate::test_ids::TEST_KEY_ID_1;
use acl_resolver::auth::{ClaimVerifier, WorkloadIdentityVerifier};
use acl_resolver::config::Config;
use acl_resolver::leader::{leader_acl_channel, LeaderAclPublisher};
use acl_resolver::state::{InMemoryStateStore, StateStore};
use acl_resolver::AclResolver;
use common::secret::SecretString;
use std::sync::Arc;

/// A resolver plus handles on everything it reads.
pub struct TestResolver {
    pub resolver: AclResolver,
    pub store: Arc<InMemoryStateStore>,
    pub counts: Arc<LookupCounts>,
    pub signing_key: TestSigningKey,
    pub leader: LeaderAclPublisher,
}

impl TestResolver {
    /// ACL enforcement enabled, default cache size.
    pub fn new() -> Self {
        Self::with_config(Config {
            acl_enabled: true,
            ..Config::default()
        })
    }

    /// ACL enforcement disabled.
    pub fn acl_disabled() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(InMemoryStateStore::new());
        let instrumented = InstrumentedStore::new(Arc::clone(&store));
        let counts = instrumented.counts();

        let signing_key = test_signing_key(1, TEST_KEY_ID_1).expect("test signing key");
        let verifier: Arc<dyn ClaimVerifier> = Arc::new(WorkloadIdentityVerifier::new(
            Arc::new(signing_key.keyring()),
            config.clock_skew_seconds,
        ));

        let (leader, leader_rx) = leader_acl_channel();
        let state: Arc<dyn StateStore> = Arc::new(instrumented);
        let resolver = AclResolver::new(config, state, verifier, leader_rx);

        Self {
            resolver,
            store,
            counts,
            signing_key,
            leader,
        }
    }

    /// Publish `secret` as the current leader secret.
    pub fn become_leader(&self, secret: &str) {
        self.leader.publish(SecretString::from(secret));
    }
}

impl Default for TestResolver {
    fn default() -> Self {
        Self::new()
    }
}
