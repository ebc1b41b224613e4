//! Common utilities and types shared across control plane components.

#![warn(clippy::pedantic)]

/// Module for identifier format helpers
pub mod types;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (validation, key decoding, constants)
pub mod jwt;
