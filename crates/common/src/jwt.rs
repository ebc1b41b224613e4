//! JWT utilities shared by control plane verifiers.
//!
//! Workload identities are EdDSA-signed JWTs. Before any signature work a
//! verifier needs to:
//!
//! - bound the token size,
//! - read the unverified header to pick the signing key (`kid`),
//! - after verification, reject `iat` values too far in the future.
//!
//! Everything here operates on untrusted input. Error messages are generic;
//! details are logged at debug level under the `common.jwt` target.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Maximum accepted JWT size in bytes (8KB).
///
/// Checked before base64 decoding so oversized input costs nothing.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default clock skew tolerance for `iat` validation (5 minutes).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Upper bound accepted for a configured clock skew (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// The only signing algorithm accepted for workload identities.
pub const EDDSA_ALGORITHM: &str = "EdDSA";

/// Errors that can occur while inspecting or validating a JWT.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The identity token is invalid or expired")]
    TokenTooLarge,

    /// Not a three-part JWT, or the header is not base64url JSON.
    #[error("The identity token is invalid or expired")]
    MalformedToken,

    /// Header has no usable `kid`.
    #[error("The identity token is invalid or expired")]
    MissingKid,

    /// Header names an algorithm other than [`EDDSA_ALGORITHM`].
    #[error("The identity token is invalid or expired")]
    UnsupportedAlgorithm,

    /// `iat` is more than the allowed skew in the future.
    #[error("The identity token is invalid or expired")]
    IatTooFarInFuture,
}

/// The unverified JOSE header of a JWT.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtHeader {
    pub alg: String,

    #[serde(default)]
    pub kid: Option<String>,

    #[serde(default)]
    pub typ: Option<String>,
}

/// Returns true when `token` has the `header.payload.signature` shape.
///
/// This is a cheap structural check used to route a presented credential;
/// it says nothing about validity.
#[must_use]
pub fn looks_like_jwt(token: &str) -> bool {
    let mut parts = token.split('.');
    let shape_ok = parts.by_ref().take(3).filter(|p| !p.is_empty()).count() == 3;
    shape_ok && parts.next().is_none()
}

/// Decode the JOSE header of `token` without verifying anything.
///
/// # Errors
///
/// - `TokenTooLarge` when the token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` when the token is not a three-part JWT or the header
///   is not base64url-encoded JSON
pub fn decode_header(token: &str) -> Result<JwtHeader, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    if !looks_like_jwt(token) {
        tracing::debug!(target: "common.jwt", "Token rejected: not a three-part JWT");
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = token
        .split('.')
        .next()
        .ok_or(JwtValidationError::MalformedToken)?;

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })
}

/// Extract the signing key ID from an EdDSA JWT header.
///
/// The returned `kid` must only be used to look a key up in a trusted
/// keyring; the token still has to be verified with that key.
///
/// # Errors
///
/// Everything [`decode_header`] returns, plus `UnsupportedAlgorithm` when the
/// header does not declare `EdDSA` and `MissingKid` when `kid` is absent or
/// empty.
pub fn extract_kid(token: &str) -> Result<String, JwtValidationError> {
    let header = decode_header(token)?;

    if header.alg != EDDSA_ALGORITHM {
        tracing::debug!(target: "common.jwt", alg = %header.alg, "Token rejected: unsupported algorithm");
        return Err(JwtValidationError::UnsupportedAlgorithm);
    }

    header
        .kid
        .filter(|kid| !kid.is_empty())
        .ok_or(JwtValidationError::MissingKid)
}

/// Validate the `iat` claim against the current time.
///
/// # Errors
///
/// Returns `IatTooFarInFuture` when `iat` is later than now plus `clock_skew`.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    validate_iat_at(iat, clock_skew, chrono::Utc::now().timestamp())
}

/// `iat` validation against an explicit `now`, for boundary tests.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    let skew_secs = i64::try_from(clock_skew.as_secs()).unwrap_or(i64::MAX);
    let max_iat = now.saturating_add(skew_secs);

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

/// Decode an Ed25519 public key from PEM (header and footer optional).
///
/// # Errors
///
/// Returns `base64::DecodeError` if the body is not standard base64.
pub fn decode_ed25519_public_key_pem(pem: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let b64: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("-----"))
        .collect();

    base64::engine::general_purpose::STANDARD.decode(b64)
}

/// Decode an Ed25519 public key from the base64url `x` member of an OKP JWK.
///
/// # Errors
///
/// Returns `base64::DecodeError` if the value is not unpadded base64url.
pub fn decode_ed25519_public_key_jwk(x_b64url: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(x_b64url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn token_with_header(header: &str) -> String {
        format!("{}.payload.signature", URL_SAFE_NO_PAD.encode(header))
    }

    #[test]
    fn test_looks_like_jwt() {
        assert!(looks_like_jwt("a.b.c"));
        assert!(!looks_like_jwt("a.b"));
        assert!(!looks_like_jwt("a.b.c.d"));
        assert!(!looks_like_jwt("a..c"));
        assert!(!looks_like_jwt(""));
        assert!(!looks_like_jwt("7a1c0e52-3d5b-4b7e-8f2a-9c6d4e1b0a33"));
    }

    #[test]
    fn test_extract_kid_valid_token() {
        let token = token_with_header(r#"{"alg":"EdDSA","typ":"JWT","kid":"wi-key-01"}"#);
        assert_eq!(extract_kid(&token).unwrap(), "wi-key-01");
    }

    #[test]
    fn test_extract_kid_missing_kid() {
        let token = token_with_header(r#"{"alg":"EdDSA","typ":"JWT"}"#);
        assert_eq!(extract_kid(&token), Err(JwtValidationError::MissingKid));
    }

    #[test]
    fn test_extract_kid_empty_kid() {
        let token = token_with_header(r#"{"alg":"EdDSA","kid":""}"#);
        assert_eq!(extract_kid(&token), Err(JwtValidationError::MissingKid));
    }

    #[test]
    fn test_extract_kid_non_string_kid() {
        let token = token_with_header(r#"{"alg":"EdDSA","kid":12345}"#);
        assert_eq!(extract_kid(&token), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_extract_kid_rejects_other_algorithms() {
        let token = token_with_header(r#"{"alg":"HS256","kid":"k"}"#);
        assert_eq!(
            extract_kid(&token),
            Err(JwtValidationError::UnsupportedAlgorithm)
        );
    }

    #[test]
    fn test_extract_kid_malformed_token() {
        assert_eq!(extract_kid("not-a-jwt"), Err(JwtValidationError::MalformedToken));
        assert_eq!(extract_kid(""), Err(JwtValidationError::MalformedToken));
        assert_eq!(
            extract_kid("!!!invalid!!!.payload.signature"),
            Err(JwtValidationError::MalformedToken)
        );
        let not_json = format!("{}.payload.signature", URL_SAFE_NO_PAD.encode("not-json"));
        assert_eq!(extract_kid(&not_json), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_extract_kid_oversized_token() {
        let oversized = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert_eq!(extract_kid(&oversized), Err(JwtValidationError::TokenTooLarge));
    }

    #[test]
    fn test_validate_iat_boundaries() {
        let now = 1_700_000_000_i64;

        assert!(validate_iat_at(now - 3600, DEFAULT_CLOCK_SKEW, now).is_ok());
        assert!(validate_iat_at(now + 300, DEFAULT_CLOCK_SKEW, now).is_ok());
        assert_eq!(
            validate_iat_at(now + 301, DEFAULT_CLOCK_SKEW, now),
            Err(JwtValidationError::IatTooFarInFuture)
        );
    }

    #[test]
    fn test_validate_iat_current_time() {
        assert!(validate_iat(chrono::Utc::now().timestamp(), DEFAULT_CLOCK_SKEW).is_ok());
    }

    #[test]
    fn test_decode_ed25519_public_key_pem() {
        let pem = "-----BEGIN PUBLIC KEY-----\ndGVzdA==\n-----END PUBLIC KEY-----";
        assert_eq!(decode_ed25519_public_key_pem(pem).unwrap(), b"test");
        assert!(decode_ed25519_public_key_pem("!!!").is_err());
    }

    #[test]
    fn test_decode_ed25519_public_key_jwk() {
        let x = "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo";
        assert_eq!(decode_ed25519_public_key_jwk(x).unwrap().len(), 32);
        assert!(decode_ed25519_public_key_jwk("not-valid-base64url!!!").is_err());
    }
}
