//! RPC authentication.
//!
//! One secret field carries every credential kind: ACL token secrets and
//! node secrets are UUIDs, workload identities are JWTs, and the leader uses
//! an internal UUID that is never stored. The authenticator tries them in a
//! fixed order, deciding on the token lookup's outcome:
//!
//! | Token lookup | Next step |
//! |---|---|
//! | ACL disabled | `AclDisabled` |
//! | token (not anonymous) | `Token` |
//! | anonymous | identify by peer address |
//! | expired | fail, no fallback |
//! | not a UUID | verify as workload identity, no further fallback |
//! | not found | leader secret, then node secret, then peer address |
//! | store error | fail, wrapped as "could not resolve user" |

use super::AclResolver;
use crate::errors::AuthError;
use crate::models::{AclToken, AuthenticatedIdentity};
use crate::rpc::{PeerAddr, RpcContext};
use std::sync::Arc;
use tracing::instrument;

/// Outcome of the credential checks, before peer identification.
enum Credential {
    Resolved(AuthenticatedIdentity),
    /// Anonymous or unknown secret; identify the caller by transport.
    Unidentified(Option<Arc<AclToken>>),
}

impl AclResolver {
    /// Establish who is calling.
    ///
    /// `ctx` is `None` for internal calls made by the leader's own
    /// background workers; those carry no transport facts. Such a call gets
    /// whatever token its secret resolved to, or
    /// [`AuthenticatedIdentity::Unresolved`] when it resolved to none.
    ///
    /// # Errors
    ///
    /// - `TokenExpired` for an expired token
    /// - `ClaimVerificationFailed` for a non-UUID secret that is not a valid
    ///   workload identity of a live allocation
    /// - `AddressResolutionFailed` when the peer address is not a network
    ///   address
    /// - `PermissionDenied` when no identity or peer address is available
    /// - `StoreUnavailable` when state cannot be read
    #[instrument(skip_all, fields(has_ctx = ctx.is_some()))]
    pub fn authenticate(
        &self,
        ctx: Option<&RpcContext>,
        secret_id: &str,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        if let Some(node_id) = ctx.and_then(|ctx| ctx.node_id.as_deref()) {
            return Ok(AuthenticatedIdentity::Node {
                node_id: node_id.to_string(),
            });
        }

        let token = match self.identify_credential(secret_id)? {
            Credential::Resolved(identity) => {
                tracing::debug!(target: "acl.authenticate", kind = identity.kind(), "Authenticated");
                return Ok(identity);
            }
            Credential::Unidentified(token) => token,
        };

        let Some(ctx) = ctx else {
            // Internal call: no transport to identify.
            return Ok(match token {
                Some(token) => AuthenticatedIdentity::Token(token),
                None => AuthenticatedIdentity::Unresolved,
            });
        };

        identify_peer(ctx, token)
    }

    fn identify_credential(&self, secret_id: &str) -> Result<Credential, AuthError> {
        match self.resolve_secret_token(secret_id) {
            Ok(None) => Ok(Credential::Resolved(AuthenticatedIdentity::AclDisabled)),

            Ok(Some(token)) if Arc::ptr_eq(&token, &AclToken::anonymous()) => {
                Ok(Credential::Unidentified(Some(token)))
            }

            Ok(Some(token)) => Ok(Credential::Resolved(AuthenticatedIdentity::Token(token))),

            Err(AuthError::TokenInvalid) => {
                let claims = self.verify_claim(secret_id).inspect_err(|e| {
                    tracing::debug!(target: "acl.authenticate", error = %e, "Workload identity rejected");
                })?;
                Ok(Credential::Resolved(AuthenticatedIdentity::Workload(claims)))
            }

            Err(AuthError::TokenNotFound) => {
                if self.leader_acl.matches(secret_id) {
                    return Ok(Credential::Resolved(AuthenticatedIdentity::Token(
                        AclToken::leader(),
                    )));
                }

                // Nodes present their secret until the connection is
                // registered.
                let node = self
                    .snapshot()?
                    .node_by_secret_id(secret_id)
                    .map_err(|e| {
                        AuthError::StoreUnavailable(format!("could not resolve node secret: {e}"))
                    })?;

                Ok(match node {
                    Some(node) => Credential::Resolved(AuthenticatedIdentity::Node {
                        node_id: node.id.clone(),
                    }),
                    None => Credential::Unidentified(None),
                })
            }

            Err(AuthError::StoreUnavailable(reason)) => Err(AuthError::StoreUnavailable(format!(
                "could not resolve user: {reason}"
            ))),

            Err(e) => Err(e),
        }
    }
}

/// Identify a caller that presented no usable credential by its TLS name and
/// remote IP. The session address wins over the connection address.
fn identify_peer(
    ctx: &RpcContext,
    token: Option<Arc<AclToken>>,
) -> Result<AuthenticatedIdentity, AuthError> {
    let Some(addr) = ctx.peer_addr() else {
        tracing::error!(
            target: "acl.authenticate",
            "Could not authenticate RPC request or determine remote address"
        );
        return Err(AuthError::PermissionDenied);
    };

    let remote_ip = match addr {
        PeerAddr::Tcp(addr) => addr.ip(),
        PeerAddr::Unix(path) => {
            tracing::warn!(
                target: "acl.authenticate",
                path = %path.display(),
                "Peer address is not a TCP address"
            );
            return Err(AuthError::AddressResolutionFailed(
                "peer address was not a TCP address".to_string(),
            ));
        }
    };

    tracing::debug!(
        target: "acl.authenticate",
        remote_ip = %remote_ip,
        tls = ctx.tls.is_some(),
        has_token = token.is_some(),
        "Identified peer by address"
    );

    Ok(AuthenticatedIdentity::Peer {
        token,
        tls_name: ctx.tls_name().map(str::to_string),
        remote_ip,
    })
}
