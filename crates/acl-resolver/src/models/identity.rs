//! The resolved principal of one RPC.

use crate::auth::IdentityClaims;
use crate::models::AclToken;
use std::net::IpAddr;
use std::sync::Arc;

/// Who is calling, as established by [`AclResolver::authenticate`].
///
/// Exactly one kind of identity is set per request. Created fresh per
/// request and owned by the RPC handler; never persisted.
///
/// [`AclResolver::authenticate`]: crate::services::AclResolver::authenticate
#[derive(Debug, Clone)]
pub enum AuthenticatedIdentity {
    /// A registered client node, identified by connection or node secret.
    Node { node_id: String },

    /// A resolved bearer token. Also used for the leader sentinel and for
    /// internal requests that carry no RPC context.
    Token(Arc<AclToken>),

    /// A verified workload identity.
    Workload(IdentityClaims),

    /// A caller with no stronger credential than the anonymous token (or an
    /// unknown secret, in which case `token` is `None`), identified by its
    /// TLS certificate and network address. This is how peer servers are
    /// recognized.
    Peer {
        token: Option<Arc<AclToken>>,
        tls_name: Option<String>,
        remote_ip: IpAddr,
    },

    /// An internal request (no RPC context) whose secret matched no token,
    /// leader secret or node. Carries no privilege.
    Unresolved,

    /// ACL enforcement is disabled and the caller is not a known node.
    AclDisabled,
}

impl AuthenticatedIdentity {
    /// Node ID when the caller is a client node.
    pub fn client_id(&self) -> Option<&str> {
        match self {
            AuthenticatedIdentity::Node { node_id } => Some(node_id),
            _ => None,
        }
    }

    /// Token when the identity carries one (plain token or peer).
    pub fn acl_token(&self) -> Option<&Arc<AclToken>> {
        match self {
            AuthenticatedIdentity::Token(token) => Some(token),
            AuthenticatedIdentity::Peer { token, .. } => token.as_ref(),
            _ => None,
        }
    }

    pub fn claims(&self) -> Option<&IdentityClaims> {
        match self {
            AuthenticatedIdentity::Workload(claims) => Some(claims),
            _ => None,
        }
    }

    pub fn tls_name(&self) -> Option<&str> {
        match self {
            AuthenticatedIdentity::Peer { tls_name, .. } => tls_name.as_deref(),
            _ => None,
        }
    }

    pub fn remote_ip(&self) -> Option<IpAddr> {
        match self {
            AuthenticatedIdentity::Peer { remote_ip, .. } => Some(*remote_ip),
            _ => None,
        }
    }

    /// Short label for logs; never contains identifiers or secrets.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthenticatedIdentity::Node { .. } => "node",
            AuthenticatedIdentity::Token(_) => "token",
            AuthenticatedIdentity::Workload(_) => "workload",
            AuthenticatedIdentity::Peer { .. } => "peer",
            AuthenticatedIdentity::Unresolved => "unresolved",
            AuthenticatedIdentity::AclDisabled => "acl_disabled",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_node_accessors() {
        let identity = AuthenticatedIdentity::Node {
            node_id: "node-1".to_string(),
        };
        assert_eq!(identity.client_id(), Some("node-1"));
        assert!(identity.acl_token().is_none());
        assert!(identity.claims().is_none());
        assert_eq!(identity.kind(), "node");
    }

    #[test]
    fn test_peer_accessors() {
        let identity = AuthenticatedIdentity::Peer {
            token: Some(AclToken::anonymous()),
            tls_name: Some("server.global.cluster".to_string()),
            remote_ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)),
        };

        assert!(identity.acl_token().unwrap().is_anonymous());
        assert_eq!(identity.tls_name(), Some("server.global.cluster"));
        assert_eq!(
            identity.remote_ip(),
            Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)))
        );
        assert!(identity.client_id().is_none());
    }

    #[test]
    fn test_peer_without_token() {
        let identity = AuthenticatedIdentity::Peer {
            token: None,
            tls_name: None,
            remote_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        assert!(identity.acl_token().is_none());
        assert_eq!(identity.remote_ip(), Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert_eq!(identity.kind(), "peer");
    }

    #[test]
    fn test_token_accessors() {
        let identity = AuthenticatedIdentity::Token(AclToken::leader());
        assert!(identity.acl_token().unwrap().is_leader());
        assert!(identity.remote_ip().is_none());
        assert!(identity.tls_name().is_none());
    }

    #[test]
    fn test_unresolved_has_nothing() {
        let identity = AuthenticatedIdentity::Unresolved;
        assert!(identity.acl_token().is_none());
        assert!(identity.client_id().is_none());
        assert!(identity.claims().is_none());
        assert_eq!(identity.kind(), "unresolved");
    }

    #[test]
    fn test_acl_disabled_has_nothing() {
        let identity = AuthenticatedIdentity::AclDisabled;
        assert!(identity.acl_token().is_none());
        assert!(identity.client_id().is_none());
        assert_eq!(identity.kind(), "acl_disabled");
    }
}
