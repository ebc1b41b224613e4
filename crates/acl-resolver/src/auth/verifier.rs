//! Workload identity verification.
//!
//! # Security
//!
//! - Tokens are size-checked before parsing
//! - Only EdDSA (Ed25519) is accepted
//! - `exp` is enforced by `jsonwebtoken`; `iat` is checked with clock skew
//!   tolerance afterwards

use super::claims::IdentityClaims;
use super::keyring::Keyring;
use common::jwt::{extract_kid, validate_iat};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, Validation};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

/// Why a workload identity was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("identity token is malformed")]
    Malformed,

    #[error("identity token signed by unknown key")]
    UnknownKey,

    #[error("identity token signature is invalid")]
    InvalidSignature,

    #[error("identity token expired")]
    Expired,

    #[error("signing keyring unavailable")]
    KeyringUnavailable,

    /// The allocation is gone, or no longer references a job.
    #[error("allocation does not exist")]
    AllocationNotFound,

    #[error("allocation is terminal")]
    AllocationTerminal,
}

/// Verifies a signed workload identity and returns its claims.
///
/// Implementations check the signature and expiry only. Whether the claimed
/// allocation is still live is checked by the resolver against state.
pub trait ClaimVerifier: Send + Sync {
    fn verify_claim(&self, token: &str) -> Result<IdentityClaims, ClaimError>;
}

/// [`ClaimVerifier`] for EdDSA JWTs signed by a key in a [`Keyring`].
#[derive(Debug, Clone)]
pub struct WorkloadIdentityVerifier {
    keyring: Arc<Keyring>,
    clock_skew: Duration,
}

impl WorkloadIdentityVerifier {
    pub fn new(keyring: Arc<Keyring>, clock_skew_seconds: u64) -> Self {
        Self {
            keyring,
            clock_skew: Duration::from_secs(clock_skew_seconds),
        }
    }

    pub fn keyring(&self) -> &Arc<Keyring> {
        &self.keyring
    }
}

impl ClaimVerifier for WorkloadIdentityVerifier {
    /// # Security Checks
    ///
    /// 1. Size check and `kid` extraction from the header
    /// 2. Key lookup in the keyring
    /// 3. EdDSA signature and `exp` verification
    /// 4. `iat` validation with clock skew tolerance
    #[instrument(skip_all)]
    fn verify_claim(&self, token: &str) -> Result<IdentityClaims, ClaimError> {
        let kid = extract_kid(token).map_err(|e| {
            tracing::debug!(target: "acl.verifier", error = ?e, "Token kid extraction failed");
            ClaimError::Malformed
        })?;

        let key = self
            .keyring
            .get(&kid)
            .map_err(|e| {
                tracing::error!(target: "acl.verifier", error = %e, "Keyring read failed");
                ClaimError::KeyringUnavailable
            })?
            .ok_or_else(|| {
                tracing::warn!(target: "acl.verifier", kid = %kid, "Identity signed by unknown key");
                ClaimError::UnknownKey
            })?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        let token_data = decode::<IdentityClaims>(token, &key, &validation).map_err(|e| {
            tracing::debug!(target: "acl.verifier", kid = %kid, error = %e, "Token verification failed");
            match e.kind() {
                ErrorKind::ExpiredSignature => ClaimError::Expired,
                ErrorKind::InvalidSignature => ClaimError::InvalidSignature,
                _ => ClaimError::Malformed,
            }
        })?;

        let claims = token_data.claims;

        if let Err(e) = validate_iat(claims.iat, self.clock_skew) {
            tracing::debug!(target: "acl.verifier", error = ?e, "Token iat validation failed");
            return Err(ClaimError::Malformed);
        }

        tracing::debug!(
            target: "acl.verifier",
            alloc_id = %claims.allocation_id,
            "Workload identity verified"
        );
        Ok(claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::keyring::Jwk;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use ring::rand::SystemRandom;
    use ring::signature::{Ed25519KeyPair, KeyPair};

    struct Signer {
        pkcs8: Vec<u8>,
        public_key: Vec<u8>,
    }

    impl Signer {
        fn generate() -> Self {
            let rng = SystemRandom::new();
            let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
            let key_pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
            Self {
                pkcs8: pkcs8.as_ref().to_vec(),
                public_key: key_pair.public_key().as_ref().to_vec(),
            }
        }

        fn jwk(&self, kid: &str) -> Jwk {
            Jwk {
                kty: "OKP".to_string(),
                kid: kid.to_string(),
                crv: Some("Ed25519".to_string()),
                x: Some(URL_SAFE_NO_PAD.encode(&self.public_key)),
                alg: Some("EdDSA".to_string()),
                key_use: Some("sig".to_string()),
            }
        }

        fn sign(&self, kid: &str, claims: &IdentityClaims) -> String {
            let mut header = Header::new(Algorithm::EdDSA);
            header.kid = Some(kid.to_string());
            encode(&header, claims, &EncodingKey::from_ed_der(&self.pkcs8)).unwrap()
        }
    }

    fn claims_at(iat: i64, exp: i64) -> IdentityClaims {
        IdentityClaims {
            allocation_id: "alloc-1".to_string(),
            task: "web".to_string(),
            namespace: "default".to_string(),
            job_id: "example".to_string(),
            sub: "global:default:example:web:web:default".to_string(),
            exp,
            iat,
            nbf: None,
        }
    }

    fn valid_claims() -> IdentityClaims {
        let now = chrono::Utc::now().timestamp();
        claims_at(now, now + 3600)
    }

    fn verifier_with(signer: &Signer, kid: &str) -> WorkloadIdentityVerifier {
        let keyring = Arc::new(Keyring::new());
        keyring.insert_jwk(&signer.jwk(kid)).unwrap();
        WorkloadIdentityVerifier::new(keyring, 300)
    }

    #[test]
    fn test_verify_valid_token() {
        let signer = Signer::generate();
        let verifier = verifier_with(&signer, "key-1");
        let claims = valid_claims();

        let verified = verifier.verify_claim(&signer.sign("key-1", &claims)).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn test_rejects_unknown_kid() {
        let signer = Signer::generate();
        let verifier = verifier_with(&signer, "key-1");

        let token = signer.sign("key-2", &valid_claims());
        assert_eq!(verifier.verify_claim(&token), Err(ClaimError::UnknownKey));
    }

    #[test]
    fn test_rejects_wrong_signing_key() {
        let trusted = Signer::generate();
        let attacker = Signer::generate();
        let verifier = verifier_with(&trusted, "key-1");

        let token = attacker.sign("key-1", &valid_claims());
        assert_eq!(
            verifier.verify_claim(&token),
            Err(ClaimError::InvalidSignature)
        );
    }

    #[test]
    fn test_rejects_expired_token() {
        let signer = Signer::generate();
        let verifier = verifier_with(&signer, "key-1");
        let now = chrono::Utc::now().timestamp();

        let token = signer.sign("key-1", &claims_at(now - 7200, now - 3600));
        assert_eq!(verifier.verify_claim(&token), Err(ClaimError::Expired));
    }

    #[test]
    fn test_rejects_iat_far_in_future() {
        let signer = Signer::generate();
        let verifier = verifier_with(&signer, "key-1");
        let now = chrono::Utc::now().timestamp();

        let token = signer.sign("key-1", &claims_at(now + 3600, now + 7200));
        assert_eq!(verifier.verify_claim(&token), Err(ClaimError::Malformed));
    }

    #[test]
    fn test_accepts_iat_within_skew() {
        let signer = Signer::generate();
        let verifier = verifier_with(&signer, "key-1");
        let now = chrono::Utc::now().timestamp();

        let token = signer.sign("key-1", &claims_at(now + 60, now + 3600));
        assert!(verifier.verify_claim(&token).is_ok());
    }

    #[test]
    fn test_rejects_garbage() {
        let signer = Signer::generate();
        let verifier = verifier_with(&signer, "key-1");

        for token in ["", "not-a-jwt", "a.b.c", "7a1c0e52-3d5b-4b7e-8f2a-9c6d4e1b0a33"] {
            assert_eq!(
                verifier.verify_claim(token),
                Err(ClaimError::Malformed),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_removed_key_no_longer_verifies() {
        let signer = Signer::generate();
        let verifier = verifier_with(&signer, "key-1");
        let token = signer.sign("key-1", &valid_claims());

        assert!(verifier.verify_claim(&token).is_ok());
        verifier.keyring().remove("key-1").unwrap();
        assert_eq!(verifier.verify_claim(&token), Err(ClaimError::UnknownKey));
    }
}
