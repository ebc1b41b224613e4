//! Deterministic cryptographic fixtures for testing
//!
//! Provides reproducible Ed25519 keypairs for signing workload identities.
//! All fixtures are deterministic based on seed values.

use acl_resolver::auth::{IdentityClaims, Jwk, Keyring};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::signature::{Ed25519KeyPair, KeyPair};
use thiserror::Error;

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

/// A deterministic Ed25519 signing key with its key ID.
#[derive(Clone)]
pub struct TestSigningKey {
    pub kid: String,
    pub public_key: Vec<u8>,
    pub private_key_pkcs8: Vec<u8>,
}

impl TestSigningKey {
    /// Public key as an OKP JWK.
    pub fn jwk(&self) -> Jwk {
        Jwk {
            kty: "OKP".to_string(),
            kid: self.kid.clone(),
            crv: Some("Ed25519".to_string()),
            x: Some(URL_SAFE_NO_PAD.encode(&self.public_key)),
            alg: Some("EdDSA".to_string()),
            key_use: Some("sig".to_string()),
        }
    }

    /// JWK set document containing only this key.
    pub fn jwks_json(&self) -> String {
        serde_json::json!({
            "keys": [{
                "kty": "OKP",
                "kid": self.kid,
                "crv": "Ed25519",
                "x": URL_SAFE_NO_PAD.encode(&self.public_key),
                "alg": "EdDSA",
                "use": "sig",
            }]
        })
        .to_string()
    }

    /// Keyring trusting only this key.
    pub fn keyring(&self) -> Keyring {
        let keyring = Keyring::new();
        keyring
            .insert_jwk(&self.jwk())
            .expect("test key should be accepted");
        keyring
    }

    /// Sign `claims` as an EdDSA JWT with this key's `kid`.
    pub fn sign(&self, claims: &IdentityClaims) -> String {
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(self.kid.clone());
        header.typ = Some("JWT".to_string());

        let encoding_key = EncodingKey::from_ed_der(&self.private_key_pkcs8);
        encode(&header, claims, &encoding_key).expect("Failed to sign test identity")
    }
}

/// Generate a deterministic Ed25519 signing key for testing.
///
/// The same seed always produces the same keypair.
///
/// # Example
/// ```rust,ignore
/// let key = test_signing_key(1, TEST_KEY_ID_1)?;
/// let jwt = key.sign(&IdentityClaimsBuilder::new().build());
/// ```
pub fn test_signing_key(seed: u8, kid: &str) -> Result<TestSigningKey, FixtureError> {
    // Create deterministic 32-byte seed from input
    let mut seed_bytes = [0u8; 32];
    for (i, byte) in seed_bytes.iter_mut().enumerate() {
        *byte = seed.wrapping_mul(i as u8 + 1).wrapping_add(i as u8);
    }

    let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
        .map_err(|e| FixtureError::Crypto(format!("Failed to generate test keypair: {:?}", e)))?;

    Ok(TestSigningKey {
        kid: kid.to_string(),
        public_key: key_pair.public_key().as_ref().to_vec(),
        private_key_pkcs8: build_pkcs8_from_seed(&seed_bytes),
    })
}

/// Build PKCS#8 v1 document from Ed25519 seed
///
/// This is a test-only utility. Production code must use ring::rand::SystemRandom.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    // SEQUENCE { version INTEGER 0, AlgorithmIdentifier { OID 1.3.101.112 },
    //            OCTET STRING { OCTET STRING seed } }
    let mut pkcs8 = vec![0x30, 0x2e, 0x02, 0x01, 0x00];
    pkcs8.extend_from_slice(&[0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70]);
    pkcs8.extend_from_slice(&[0x04, 0x22, 0x04, 0x20]);
    pkcs8.extend_from_slice(seed);
    pkcs8
}
