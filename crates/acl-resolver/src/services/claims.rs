//! Workload identity resolution.

use super::AclResolver;
use crate::acl::Acl;
use crate::auth::{ClaimError, IdentityClaims};
use crate::errors::AuthError;
use crate::models::{AclPolicy, Allocation};
use crate::state::StateSnapshot;
use std::sync::Arc;
use tracing::instrument;

impl AclResolver {
    /// Verify a signed workload identity and check that its allocation is
    /// still live.
    ///
    /// Claims of a terminal allocation are rejected even when the signature
    /// and expiry are valid: the workload they were issued to is gone.
    #[instrument(skip_all)]
    pub fn verify_claim(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        let claims = self.verifier.verify_claim(token)?;

        let snap = self.snapshot()?;
        let alloc = live_job_alloc(snap.as_ref(), &claims)?;

        if alloc.is_terminal() {
            tracing::debug!(
                target: "acl.claims",
                alloc_id = %alloc.id,
                "Rejecting claims for terminal allocation"
            );
            return Err(ClaimError::AllocationTerminal.into());
        }

        Ok(claims)
    }

    /// Compile the ACL for verified claims.
    ///
    /// A workload with no attached policy gets [`Acl::deny_all`], not an
    /// error.
    #[instrument(skip_all, fields(alloc_id = %claims.allocation_id))]
    pub fn resolve_claims(&self, claims: &IdentityClaims) -> Result<Option<Arc<Acl>>, AuthError> {
        if !self.acl_enabled() {
            return Ok(None);
        }

        let policies = self.resolve_policies_for_claims(claims)?;
        if policies.is_empty() {
            return Ok(Some(Acl::deny_all()));
        }

        Ok(Some(self.cache.compile(&policies)?))
    }

    /// Policies attached to the claimed allocation's job, group or task.
    #[instrument(skip_all, fields(alloc_id = %claims.allocation_id))]
    pub fn resolve_policies_for_claims(
        &self,
        claims: &IdentityClaims,
    ) -> Result<Vec<Arc<AclPolicy>>, AuthError> {
        let snap = self.snapshot()?;
        policies_for_claims(snap.as_ref(), claims)
    }
}

/// Look up the claimed allocation, which must exist and reference a job.
fn live_job_alloc(
    snap: &dyn StateSnapshot,
    claims: &IdentityClaims,
) -> Result<Arc<Allocation>, AuthError> {
    match snap.alloc_by_id(&claims.allocation_id)? {
        Some(alloc) if alloc.job.is_some() => Ok(alloc),
        _ => {
            tracing::debug!(
                target: "acl.claims",
                alloc_id = %claims.allocation_id,
                "Claimed allocation does not exist"
            );
            Err(ClaimError::AllocationNotFound.into())
        }
    }
}

fn policies_for_claims(
    snap: &dyn StateSnapshot,
    claims: &IdentityClaims,
) -> Result<Vec<Arc<AclPolicy>>, AuthError> {
    let alloc = live_job_alloc(snap, claims)?;
    let Some(job) = alloc.job.as_ref() else {
        return Err(ClaimError::AllocationNotFound.into());
    };

    let policies: Vec<Arc<AclPolicy>> = snap
        .acl_policies_by_job(&alloc.namespace, &job.id)?
        .into_iter()
        .filter(|policy| applies_to(policy, &alloc.task_group, &claims.task))
        .collect();

    tracing::debug!(
        target: "acl.claims",
        alloc_id = %alloc.id,
        policy_count = policies.len(),
        "Resolved workload policies"
    );
    Ok(policies)
}

/// Whether a job-scoped policy applies to `task` in `task_group`.
///
/// An unset group scopes the policy to the whole job. A set group must
/// match; then an unset task scopes it to the group, and a set task must
/// match too.
fn applies_to(policy: &AclPolicy, task_group: &str, task: &str) -> bool {
    let Some(sel) = policy.job_acl.as_ref() else {
        return false;
    };

    if sel.group.is_empty() {
        return true;
    }
    if sel.group != task_group {
        return false;
    }
    sel.task.is_empty() || sel.task == task
}
