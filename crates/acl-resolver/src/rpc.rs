//! Per-request transport facts handed to the authenticator.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Subject of a verified TLS peer certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCertificate {
    pub common_name: String,
}

/// Remote address of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerAddr {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl PeerAddr {
    /// Remote IP, when the address is a network address.
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            PeerAddr::Tcp(addr) => Some(addr.ip()),
            PeerAddr::Unix(_) => None,
        }
    }
}

/// What the transport knows about the caller of one RPC.
///
/// `node_id` is set once a worker node has registered on a long-lived
/// connection. `session_addr` is the multiplexed stream's remote address and
/// takes precedence over the raw connection address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcContext {
    pub node_id: Option<String>,
    pub tls: Option<PeerCertificate>,
    pub session_addr: Option<PeerAddr>,
    pub conn_addr: Option<PeerAddr>,
}

impl RpcContext {
    /// Context for a plain TCP connection.
    pub fn from_tcp(addr: SocketAddr) -> Self {
        Self {
            conn_addr: Some(PeerAddr::Tcp(addr)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    #[must_use]
    pub fn with_tls(mut self, common_name: impl Into<String>) -> Self {
        self.tls = Some(PeerCertificate {
            common_name: common_name.into(),
        });
        self
    }

    #[must_use]
    pub fn with_session_addr(mut self, addr: PeerAddr) -> Self {
        self.session_addr = Some(addr);
        self
    }

    /// The address to identify the peer by, session-level first.
    pub fn peer_addr(&self) -> Option<&PeerAddr> {
        self.session_addr.as_ref().or(self.conn_addr.as_ref())
    }

    pub fn tls_name(&self) -> Option<&str> {
        self.tls.as_ref().map(|cert| cert.common_name.as_str())
    }
}
