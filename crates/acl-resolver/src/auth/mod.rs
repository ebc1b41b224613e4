//! Workload identity: claims, signing keys and the verifier seam.
//!
//! The resolver only depends on [`ClaimVerifier`]. [`WorkloadIdentityVerifier`]
//! is the in-process implementation backed by a [`Keyring`].

mod claims;
pub mod keyring;
mod verifier;

pub use claims::IdentityClaims;
pub use keyring::{Jwk, JwkSet, Keyring, KeyringError};
pub use verifier::{ClaimError, ClaimVerifier, WorkloadIdentityVerifier};
