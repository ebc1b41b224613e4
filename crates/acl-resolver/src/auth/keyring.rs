//! Public keys for workload identity verification.
//!
//! The keyring maps a signing key ID (`kid`) to an Ed25519 public key. Keys
//! are loaded from JWK documents published by the cluster's key manager, or
//! from PEM for operator-supplied keys, and rotated in place with
//! [`Keyring::insert_jwk`] and [`Keyring::remove`]. A retired key must stay
//! in the keyring until every identity it signed has expired.

use common::jwt::{decode_ed25519_public_key_jwk, decode_ed25519_public_key_pem, EDDSA_ALGORITHM};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use thiserror::Error;

/// JWK key type for Ed25519.
const OKP_KEY_TYPE: &str = "OKP";

/// JWK curve name for Ed25519.
const ED25519_CURVE: &str = "Ed25519";

/// Raw Ed25519 public key length.
const ED25519_PUBLIC_KEY_LEN: usize = 32;

/// DER prefix of an Ed25519 SubjectPublicKeyInfo, followed by the raw key.
const ED25519_SPKI_PREFIX: &[u8] = &[
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// JSON Web Key for a workload identity signing key.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (always "OKP" for Ed25519).
    pub kty: String,

    pub kid: String,

    /// Curve name (always "Ed25519").
    #[serde(default)]
    pub crv: Option<String>,

    /// Public key value (base64url encoded).
    #[serde(default)]
    pub x: Option<String>,

    /// Algorithm (should be "EdDSA").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig").
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
}

/// A JWK set document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyringError {
    #[error("invalid key set document: {0}")]
    InvalidKeySet(String),

    #[error("key {kid} rejected: {reason}")]
    UnsupportedKey { kid: String, reason: String },

    #[error("keyring lock poisoned")]
    Poisoned,
}

/// Thread-safe map of `kid` to Ed25519 verification key.
#[derive(Default)]
pub struct Keyring {
    keys: RwLock<HashMap<String, DecodingKey>>,
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kids = self.key_ids().unwrap_or_default();
        kids.sort_unstable();
        f.debug_struct("Keyring").field("kids", &kids).finish()
    }
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a keyring from a JWK set document.
    ///
    /// # Errors
    ///
    /// `InvalidKeySet` when the document does not parse, `UnsupportedKey`
    /// when any key is not an Ed25519 signing key.
    pub fn from_jwks_json(json: &str) -> Result<Self, KeyringError> {
        let keyring = Self::new();
        keyring.load_jwks_json(json)?;
        Ok(keyring)
    }

    /// Replace every key with the contents of a JWK set document.
    ///
    /// Validation happens before the swap: on error the keyring is unchanged.
    pub fn load_jwks_json(&self, json: &str) -> Result<usize, KeyringError> {
        let set: JwkSet = serde_json::from_str(json).map_err(|e| {
            tracing::warn!(target: "acl.keyring", error = %e, "Failed to parse JWK set");
            KeyringError::InvalidKeySet(e.to_string())
        })?;

        let mut keys = HashMap::with_capacity(set.keys.len());
        for jwk in &set.keys {
            keys.insert(jwk.kid.clone(), decoding_key_from_jwk(jwk)?);
        }
        let count = keys.len();

        *self.keys.write().map_err(|_| KeyringError::Poisoned)? = keys;

        tracing::info!(target: "acl.keyring", key_count = count, "Keyring loaded");
        Ok(count)
    }

    /// Add or replace one key from its JWK.
    pub fn insert_jwk(&self, jwk: &Jwk) -> Result<(), KeyringError> {
        let key = decoding_key_from_jwk(jwk)?;
        self.keys
            .write()
            .map_err(|_| KeyringError::Poisoned)?
            .insert(jwk.kid.clone(), key);

        tracing::debug!(target: "acl.keyring", kid = %jwk.kid, "Key added to keyring");
        Ok(())
    }

    /// Add or replace one key from a PEM-encoded SubjectPublicKeyInfo.
    pub fn insert_pem(&self, kid: &str, pem: &str) -> Result<(), KeyringError> {
        let der = decode_ed25519_public_key_pem(pem).map_err(|e| KeyringError::UnsupportedKey {
            kid: kid.to_string(),
            reason: format!("invalid PEM encoding: {e}"),
        })?;

        let raw = der.strip_prefix(ED25519_SPKI_PREFIX).ok_or_else(|| {
            KeyringError::UnsupportedKey {
                kid: kid.to_string(),
                reason: "not an Ed25519 public key".to_string(),
            }
        })?;
        let key = raw_decoding_key(kid, raw)?;

        self.keys
            .write()
            .map_err(|_| KeyringError::Poisoned)?
            .insert(kid.to_string(), key);

        tracing::debug!(target: "acl.keyring", kid = %kid, "Key added to keyring");
        Ok(())
    }

    /// Remove a key. Returns whether it was present.
    pub fn remove(&self, kid: &str) -> Result<bool, KeyringError> {
        let removed = self
            .keys
            .write()
            .map_err(|_| KeyringError::Poisoned)?
            .remove(kid)
            .is_some();

        if removed {
            tracing::debug!(target: "acl.keyring", kid = %kid, "Key removed from keyring");
        }
        Ok(removed)
    }

    /// Look up a verification key.
    pub fn get(&self, kid: &str) -> Result<Option<DecodingKey>, KeyringError> {
        Ok(self
            .keys
            .read()
            .map_err(|_| KeyringError::Poisoned)?
            .get(kid)
            .cloned())
    }

    pub fn key_ids(&self) -> Result<Vec<String>, KeyringError> {
        Ok(self
            .keys
            .read()
            .map_err(|_| KeyringError::Poisoned)?
            .keys()
            .cloned()
            .collect())
    }
}

fn decoding_key_from_jwk(jwk: &Jwk) -> Result<DecodingKey, KeyringError> {
    let reject = |reason: &str| {
        tracing::warn!(target: "acl.keyring", kid = %jwk.kid, reason = reason, "Rejected JWK");
        KeyringError::UnsupportedKey {
            kid: jwk.kid.clone(),
            reason: reason.to_string(),
        }
    };

    if jwk.kty != OKP_KEY_TYPE {
        return Err(reject("key type must be OKP"));
    }
    if jwk.crv.as_deref().is_some_and(|crv| crv != ED25519_CURVE) {
        return Err(reject("curve must be Ed25519"));
    }
    if jwk.alg.as_deref().is_some_and(|alg| alg != EDDSA_ALGORITHM) {
        return Err(reject("algorithm must be EdDSA"));
    }
    if jwk.key_use.as_deref().is_some_and(|key_use| key_use != "sig") {
        return Err(reject("key use must be sig"));
    }

    let x = jwk.x.as_deref().ok_or_else(|| reject("missing x"))?;
    let raw = decode_ed25519_public_key_jwk(x).map_err(|_| reject("x is not base64url"))?;
    raw_decoding_key(&jwk.kid, &raw)
}

fn raw_decoding_key(kid: &str, raw: &[u8]) -> Result<DecodingKey, KeyringError> {
    if raw.len() != ED25519_PUBLIC_KEY_LEN {
        return Err(KeyringError::UnsupportedKey {
            kid: kid.to_string(),
            reason: format!(
                "public key must be {ED25519_PUBLIC_KEY_LEN} bytes, got {}",
                raw.len()
            ),
        });
    }
    Ok(DecodingKey::from_ed_der(raw))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const PUBLIC_KEY: [u8; 32] = [7u8; 32];

    fn jwk_json(kid: &str) -> String {
        format!(
            r#"{{"kty":"OKP","kid":"{kid}","crv":"Ed25519","x":"{}","alg":"EdDSA","use":"sig"}}"#,
            URL_SAFE_NO_PAD.encode(PUBLIC_KEY)
        )
    }

    fn jwk(kid: &str) -> Jwk {
        serde_json::from_str(&jwk_json(kid)).unwrap()
    }

    #[test]
    fn test_from_jwks_json() {
        let doc = format!(r#"{{"keys":[{},{}]}}"#, jwk_json("k1"), jwk_json("k2"));
        let keyring = Keyring::from_jwks_json(&doc).unwrap();

        let mut kids = keyring.key_ids().unwrap();
        kids.sort();
        assert_eq!(kids, vec!["k1".to_string(), "k2".to_string()]);
        assert!(keyring.get("k1").unwrap().is_some());
        assert!(keyring.get("k3").unwrap().is_none());
    }

    #[test]
    fn test_load_replaces_all_keys() {
        let keyring = Keyring::new();
        keyring.insert_jwk(&jwk("old")).unwrap();

        let doc = format!(r#"{{"keys":[{}]}}"#, jwk_json("new"));
        assert_eq!(keyring.load_jwks_json(&doc).unwrap(), 1);

        assert!(keyring.get("old").unwrap().is_none());
        assert!(keyring.get("new").unwrap().is_some());
    }

    #[test]
    fn test_failed_load_leaves_keyring_unchanged() {
        let keyring = Keyring::new();
        keyring.insert_jwk(&jwk("old")).unwrap();

        let bad = r#"{"keys":[{"kty":"RSA","kid":"rsa"}]}"#;
        assert!(matches!(
            keyring.load_jwks_json(bad),
            Err(KeyringError::UnsupportedKey { .. })
        ));
        assert!(keyring.get("old").unwrap().is_some());
    }

    #[test]
    fn test_rejects_non_eddsa_jwk() {
        let keyring = Keyring::new();

        let mut wrong_alg = jwk("k");
        wrong_alg.alg = Some("RS256".to_string());
        assert!(keyring.insert_jwk(&wrong_alg).is_err());

        let mut wrong_curve = jwk("k");
        wrong_curve.crv = Some("X25519".to_string());
        assert!(keyring.insert_jwk(&wrong_curve).is_err());

        let mut missing_x = jwk("k");
        missing_x.x = None;
        assert!(keyring.insert_jwk(&missing_x).is_err());

        let mut short = jwk("k");
        short.x = Some(URL_SAFE_NO_PAD.encode([1u8; 16]));
        assert!(keyring.insert_jwk(&short).is_err());

        assert!(keyring.key_ids().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_malformed_document() {
        assert!(matches!(
            Keyring::from_jwks_json("not json"),
            Err(KeyringError::InvalidKeySet(_))
        ));
    }

    #[test]
    fn test_insert_pem() {
        let mut der = ED25519_SPKI_PREFIX.to_vec();
        der.extend_from_slice(&PUBLIC_KEY);
        let pem = format!(
            "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----",
            STANDARD.encode(&der)
        );

        let keyring = Keyring::new();
        keyring.insert_pem("pem-key", &pem).unwrap();
        assert!(keyring.get("pem-key").unwrap().is_some());
    }

    #[test]
    fn test_insert_pem_rejects_other_key_types() {
        let pem = format!(
            "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----",
            STANDARD.encode([0u8; 44])
        );
        let keyring = Keyring::new();
        assert!(keyring.insert_pem("k", &pem).is_err());
    }

    #[test]
    fn test_remove() {
        let keyring = Keyring::new();
        keyring.insert_jwk(&jwk("k")).unwrap();

        assert!(keyring.remove("k").unwrap());
        assert!(!keyring.remove("k").unwrap());
        assert!(keyring.get("k").unwrap().is_none());
    }

    #[test]
    fn test_debug_lists_kids_only() {
        let keyring = Keyring::new();
        keyring.insert_jwk(&jwk("k1")).unwrap();
        let debug_str = format!("{keyring:?}");
        assert!(debug_str.contains("k1"));
        assert!(!debug_str.contains(&URL_SAFE_NO_PAD.encode(PUBLIC_KEY)));
    }
}
