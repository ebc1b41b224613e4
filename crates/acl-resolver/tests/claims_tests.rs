//! Workload identity integration tests.
//!
//! Signed claims are verified against a live allocation and resolved to the
//! policies attached to its job, group or task.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use acl_resolver::acl::policy::{CAP_READ_JOB, CAP_READ_LOGS, CAP_SUBMIT_JOB};
use acl_resolver::acl::Acl;
use acl_resolver::AuthError;
use acl_test_utils::*;
use anyhow::Result;
use std::sync::Arc;

fn claim_error(msg: &str) -> AuthError {
    AuthError::ClaimVerificationFailed(msg.to_string())
}

fn policy_names(policies: &[Arc<acl_resolver::models::AclPolicy>]) -> Vec<&str> {
    let mut names: Vec<&str> = policies.iter().map(|p| p.name.as_str()).collect();
    names.sort_unstable();
    names
}

// =============================================================================
// VerifyClaim
// =============================================================================

#[test]
fn test_verify_claim_for_live_alloc() -> Result<()> {
    let h = TestResolver::new();
    h.store.upsert_allocation(mock_alloc())?;
    let expected = IdentityClaimsBuilder::new().build();

    let claims = h.resolver.verify_claim(&h.signing_key.sign(&expected))?;

    assert_eq!(claims, expected);
    assert_eq!(h.counts.alloc_lookups(), 1);
    Ok(())
}

#[test]
fn test_verify_claim_for_missing_alloc() {
    let h = TestResolver::new();
    let jwt = h
        .signing_key
        .sign(&IdentityClaimsBuilder::new().for_alloc(TEST_ALLOC_ID_MISSING).build());

    assert_eq!(
        h.resolver.verify_claim(&jwt).unwrap_err(),
        claim_error("allocation does not exist")
    );
}

#[test]
fn test_verify_claim_for_terminal_alloc() -> Result<()> {
    let h = TestResolver::new();
    h.store.upsert_allocation(mock_terminal_alloc())?;
    let jwt = h
        .signing_key
        .sign(&IdentityClaimsBuilder::new().for_alloc(TEST_ALLOC_ID_TERMINAL).build());

    assert_eq!(
        h.resolver.verify_claim(&jwt).unwrap_err(),
        claim_error("allocation is terminal")
    );
    Ok(())
}

#[test]
fn test_verify_claim_expired_never_reaches_store() -> Result<()> {
    let h = TestResolver::new();
    h.store.upsert_allocation(mock_alloc())?;
    let jwt = h
        .signing_key
        .sign(&IdentityClaimsBuilder::new().expires_in(-3600).build());

    let err = h.resolver.verify_claim(&jwt).unwrap_err();

    assert!(matches!(err, AuthError::ClaimVerificationFailed(_)));
    assert!(h.counts.untouched());
    Ok(())
}

#[test]
fn test_verify_claim_unknown_key() -> Result<()> {
    let h = TestResolver::new();
    h.store.upsert_allocation(mock_alloc())?;
    let rotated = test_signing_key(2, TEST_KEY_ID_2)?;

    let err = h
        .resolver
        .verify_claim(&rotated.sign(&IdentityClaimsBuilder::new().build()))
        .unwrap_err();

    assert!(matches!(err, AuthError::ClaimVerificationFailed(_)));
    assert_eq!(h.counts.alloc_lookups(), 0);
    Ok(())
}

// =============================================================================
// resolvePoliciesForClaims
// =============================================================================

#[test]
fn test_policy_scopes() -> Result<()> {
    let h = TestResolver::new();
    h.store.upsert_allocation(mock_alloc())?;
    for policy in [
        mock_job_policy("job-wide", READ_DEFAULT_RULES, "", ""),
        mock_job_policy("web-group", READ_DEFAULT_RULES, TEST_TASK_GROUP, ""),
        mock_job_policy("web-task", READ_DEFAULT_RULES, TEST_TASK_GROUP, TEST_TASK),
        mock_job_policy("sidecar-task", READ_DEFAULT_RULES, TEST_TASK_GROUP, "sidecar"),
        mock_job_policy("api-group", READ_DEFAULT_RULES, "api", ""),
        mock_policy("unattached", WRITE_DEFAULT_RULES),
    ] {
        h.store.upsert_acl_policy(policy)?;
    }

    let policies = h
        .resolver
        .resolve_policies_for_claims(&IdentityClaimsBuilder::new().build())?;

    assert_eq!(policy_names(&policies), ["job-wide", "web-group", "web-task"]);
    Ok(())
}

#[test]
fn test_group_policy_applies_to_any_task_in_group() -> Result<()> {
    let h = TestResolver::new();
    h.store.upsert_allocation(mock_alloc())?;
    h.store
        .upsert_acl_policy(mock_job_policy("web-group", READ_DEFAULT_RULES, TEST_TASK_GROUP, ""))?;

    let claims = IdentityClaimsBuilder::new().for_task("anything").build();
    let policies = h.resolver.resolve_policies_for_claims(&claims)?;

    assert_eq!(policy_names(&policies), ["web-group"]);
    Ok(())
}

#[test]
fn test_group_is_taken_from_alloc_not_claims() -> Result<()> {
    let h = TestResolver::new();
    h.store.upsert_allocation(mock_alloc_in_group("api"))?;
    h.store
        .upsert_acl_policy(mock_job_policy("web-group", READ_DEFAULT_RULES, TEST_TASK_GROUP, ""))?;
    h.store
        .upsert_acl_policy(mock_job_policy("api-group", READ_DEFAULT_RULES, "api", ""))?;

    let policies = h
        .resolver
        .resolve_policies_for_claims(&IdentityClaimsBuilder::new().build())?;

    assert_eq!(policy_names(&policies), ["api-group"]);
    Ok(())
}

#[test]
fn test_policies_for_missing_alloc() {
    let h = TestResolver::new();
    let claims = IdentityClaimsBuilder::new()
        .for_alloc(TEST_ALLOC_ID_MISSING)
        .build();

    assert_eq!(
        h.resolver.resolve_policies_for_claims(&claims).unwrap_err(),
        claim_error("allocation does not exist")
    );
}

// =============================================================================
// ResolveClaims
// =============================================================================

#[test]
fn test_resolve_claims_compiles_attached_policies() -> Result<()> {
    let h = TestResolver::new();
    h.store.upsert_allocation(mock_alloc())?;
    h.store.upsert_acl_policy(mock_job_policy(
        "logs",
        r#"{"namespaces": {"default": {"capabilities": ["read-logs"]}}}"#,
        TEST_TASK_GROUP,
        TEST_TASK,
    ))?;
    h.store
        .upsert_acl_policy(mock_job_policy("job-read", READ_DEFAULT_RULES, "", ""))?;

    let acl = h
        .resolver
        .resolve_claims(&IdentityClaimsBuilder::new().build())?
        .expect("ACL enabled");

    assert!(acl.allow_namespace_operation(TEST_NAMESPACE, CAP_READ_LOGS));
    assert!(acl.allow_namespace_operation(TEST_NAMESPACE, CAP_READ_JOB));
    assert!(!acl.allow_namespace_operation(TEST_NAMESPACE, CAP_SUBMIT_JOB));
    assert!(!acl.is_management());
    Ok(())
}

#[test]
fn test_resolve_claims_without_policies_is_deny_all() -> Result<()> {
    let h = TestResolver::new();
    h.store.upsert_allocation(mock_alloc())?;
    h.store
        .upsert_acl_policy(mock_policy("unattached", WRITE_DEFAULT_RULES))?;

    let acl = h
        .resolver
        .resolve_claims(&IdentityClaimsBuilder::new().build())?
        .expect("ACL enabled");

    assert!(Arc::ptr_eq(&acl, &Acl::deny_all()));
    assert_eq!(h.resolver.cache().entry_count(), 0);
    Ok(())
}

#[test]
fn test_resolve_claims_acl_disabled() -> Result<()> {
    let h = TestResolver::acl_disabled();

    assert!(h
        .resolver
        .resolve_claims(&IdentityClaimsBuilder::new().build())?
        .is_none());
    assert!(h.counts.untouched());
    Ok(())
}

#[test]
fn test_authenticate_then_resolve_claims() -> Result<()> {
    let h = TestResolver::new();
    h.store.upsert_allocation(mock_alloc())?;
    h.store
        .upsert_acl_policy(mock_job_policy("job-read", READ_DEFAULT_RULES, "", ""))?;
    let jwt = h.signing_key.sign(&IdentityClaimsBuilder::new().build());

    let identity = h.resolver.authenticate(None, &jwt)?;
    let claims = identity.claims().expect("workload identity");
    let acl = h.resolver.resolve_claims(claims)?.expect("ACL enabled");

    assert!(acl.allow_namespace_operation(TEST_NAMESPACE, CAP_READ_JOB));
    Ok(())
}
