//! ACL resolution error types.
//!
//! `AuthError` is the only error RPC handlers see. Lower layers have their
//! own error enums (`StoreError`, `ClaimError`, `AclError`) that convert into
//! it with `?`. Messages for the token variants match the strings clients of
//! the cluster API already match on.

use crate::acl::AclError;
use crate::auth::ClaimError;
use crate::state::StoreError;
use thiserror::Error;

/// Error type for authentication and ACL resolution.
///
/// Only `TokenNotFound` and `TokenInvalid` are recoverable inside the
/// authenticator (leader/node identification and claim verification
/// respectively). Every other variant is terminal for the request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("ACL token not found")]
    TokenNotFound,

    #[error("ACL token expired")]
    TokenExpired,

    #[error("ACL token is invalid")]
    TokenInvalid,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Claim verification failed: {0}")]
    ClaimVerificationFailed(String),

    #[error("Could not resolve peer address: {0}")]
    AddressResolutionFailed(String),

    #[error("State store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Failed to compile ACL policies: {0}")]
    PolicyCompile(String),
}

impl AuthError {
    /// Stable machine-readable code for RPC error mapping.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::TokenNotFound => "TOKEN_NOT_FOUND",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::TokenInvalid => "TOKEN_INVALID",
            AuthError::PermissionDenied => "PERMISSION_DENIED",
            AuthError::ClaimVerificationFailed(_) => "CLAIM_VERIFICATION_FAILED",
            AuthError::AddressResolutionFailed(_) => "ADDRESS_RESOLUTION_FAILED",
            AuthError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AuthError::PolicyCompile(_) => "POLICY_COMPILE_FAILED",
        }
    }

    /// True when no other credential kind may be tried for this secret.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuthError::TokenNotFound | AuthError::TokenInvalid)
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}

impl From<ClaimError> for AuthError {
    fn from(err: ClaimError) -> Self {
        AuthError::ClaimVerificationFailed(err.to_string())
    }
}

impl From<AclError> for AuthError {
    fn from(err: AclError) -> Self {
        AuthError::PolicyCompile(err.to_string())
    }
}
