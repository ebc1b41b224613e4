//! Leader ACL secret tracking.
//!
//! The elected leader generates an internal ACL secret so that its own
//! background workers can call RPC endpoints with full privilege. Leadership
//! code holds the [`LeaderAclPublisher`]; every resolver holds a
//! [`LeaderAclReceiver`] and compares presented secrets against the current
//! value without taking a lock.
//!
//! An empty value means "not leader, or leader unknown". It never matches.

use common::secret::{matches_secret, ExposeSecret, SecretString};
use std::fmt;
use tokio::sync::watch;

/// Create a connected publisher/receiver pair with no secret published.
pub fn leader_acl_channel() -> (LeaderAclPublisher, LeaderAclReceiver) {
    let (tx, rx) = watch::channel(SecretString::from(String::new()));
    (LeaderAclPublisher(tx), LeaderAclReceiver(rx))
}

/// Write side, owned by the leadership loop.
pub struct LeaderAclPublisher(watch::Sender<SecretString>);

impl LeaderAclPublisher {
    /// Publish the secret generated on winning an election.
    pub fn publish(&self, secret: SecretString) {
        self.0.send_replace(secret);
        tracing::info!(target: "acl.leader", "Leader ACL secret published");
    }

    /// Clear the secret on stepping down.
    pub fn clear(&self) {
        self.0.send_replace(SecretString::from(String::new()));
        tracing::info!(target: "acl.leader", "Leader ACL secret cleared");
    }

    pub fn subscribe(&self) -> LeaderAclReceiver {
        LeaderAclReceiver(self.0.subscribe())
    }
}

impl fmt::Debug for LeaderAclPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaderAclPublisher")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Read side, cloned into every resolver.
#[derive(Clone)]
pub struct LeaderAclReceiver(watch::Receiver<SecretString>);

impl LeaderAclReceiver {
    /// A receiver that never matches, for non-leader deployments and tests.
    pub fn none() -> Self {
        let (_publisher, receiver) = leader_acl_channel();
        receiver
    }

    /// Whether `candidate` is the current leader secret.
    pub fn matches(&self, candidate: &str) -> bool {
        matches_secret(&self.0.borrow(), candidate)
    }

    /// Whether a leader secret is currently published.
    pub fn is_set(&self) -> bool {
        !self.0.borrow().expose_secret().is_empty()
    }
}

impl fmt::Debug for LeaderAclReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaderAclReceiver")
            .field("is_set", &self.is_set())
            .finish()
    }
}
