//! Secret and token resolution.

use super::AclResolver;
use crate::acl::{resolve_acl_from_token, Acl};
use crate::errors::AuthError;
use crate::models::AclToken;
use crate::state::StateSnapshot;
use chrono::Utc;
use common::types::is_uuid;
use std::sync::Arc;
use tracing::instrument;

impl AclResolver {
    /// Resolve a bearer secret to its token record.
    ///
    /// An empty secret is the anonymous token. A secret that is not a UUID
    /// fails with `TokenInvalid` before the state store is touched, which is
    /// what lets the authenticator try it as a workload identity instead.
    ///
    /// # Errors
    ///
    /// `TokenInvalid`, `TokenNotFound`, `TokenExpired`, or `StoreUnavailable`.
    #[instrument(skip_all)]
    pub fn resolve_secret_token(&self, secret_id: &str) -> Result<Option<Arc<AclToken>>, AuthError> {
        if !self.acl_enabled() {
            return Ok(None);
        }
        if secret_id.is_empty() {
            return Ok(Some(AclToken::anonymous()));
        }
        check_secret_format(secret_id)?;

        let snap = self.snapshot()?;
        lookup_token(snap.as_ref(), secret_id).map(Some)
    }

    /// Resolve a bearer secret straight to a compiled ACL.
    ///
    /// The leader's internal secret maps to the management ACL without any
    /// state access.
    ///
    /// A non-empty secret that is not a UUID fails with `TokenInvalid`, not
    /// `TokenNotFound`, so callers can tell a malformed credential (possibly
    /// a workload identity JWT) from a well-formed secret with no token.
    ///
    /// # Errors
    ///
    /// `TokenInvalid`, `TokenNotFound`, `TokenExpired`, or `StoreUnavailable`.
    #[instrument(skip_all)]
    pub fn resolve_token(&self, secret_id: &str) -> Result<Option<Arc<Acl>>, AuthError> {
        if !self.acl_enabled() {
            return Ok(None);
        }
        if self.leader_acl.matches(secret_id) {
            tracing::debug!(target: "acl.token", "Leader secret resolved to management ACL");
            return Ok(Some(Acl::management()));
        }
        if !secret_id.is_empty() {
            check_secret_format(secret_id)?;
        }

        let snap = self.snapshot()?;
        let token = if secret_id.is_empty() {
            AclToken::anonymous()
        } else {
            lookup_token(snap.as_ref(), secret_id)?
        };

        resolve_acl_from_token(snap.as_ref(), &self.cache, &token).map(Some)
    }

    /// Compile the ACL for an already-resolved token.
    #[instrument(skip_all, fields(accessor_id = %token.accessor_id))]
    pub fn resolve_acl(&self, token: &AclToken) -> Result<Option<Arc<Acl>>, AuthError> {
        if !self.acl_enabled() {
            return Ok(None);
        }
        let snap = self.snapshot()?;
        resolve_acl_from_token(snap.as_ref(), &self.cache, token).map(Some)
    }
}

fn check_secret_format(secret_id: &str) -> Result<(), AuthError> {
    if is_uuid(secret_id) {
        Ok(())
    } else {
        tracing::debug!(target: "acl.token", "Secret is not a UUID");
        Err(AuthError::TokenInvalid)
    }
}

fn lookup_token(snap: &dyn StateSnapshot, secret_id: &str) -> Result<Arc<AclToken>, AuthError> {
    let token = snap
        .acl_token_by_secret_id(secret_id)?
        .ok_or(AuthError::TokenNotFound)?;

    if token.is_expired(Utc::now()) {
        tracing::debug!(
            target: "acl.token",
            accessor_id = %token.accessor_id,
            "Token expired"
        );
        return Err(AuthError::TokenExpired);
    }

    Ok(token)
}
