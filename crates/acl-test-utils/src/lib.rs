//! # ACL Resolver Test Utilities
//!
//! Shared test utilities for the ACL resolver.
//!
//! This crate provides:
//! - Fixed test IDs (secrets, allocation IDs, key IDs)
//! - Deterministic crypto fixtures for signing workload identities
//! - Mock records and builders (TestTokenBuilder, IdentityClaimsBuilder)
//! - Instrumented and failing state stores
//! - A resolver harness (TestResolver)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use acl_test_utils::*;
//!
//! #[test]
//! fn test_example() {
//!     let h = TestResolver::new();
//!     h.store.upsert_allocation(mock_alloc()).unwrap();
//!
//!     let jwt = h.signing_key.sign(&IdentityClaimsBuilder::new().build());
//!     let claims = h.resolver.verify_claim(&jwt).unwrap();
//! }
//! ```

pub mod crypto_fixtures;
pub mod fixtures;
pub mod harness;
pub mod instrumented_store;
pub mod test_ids;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use fixtures::*;
pub use harness::*;
pub use instrumented_store::*;
pub use test_ids::*;
