//! Workload identity claims.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims carried by a signed workload identity.
///
/// Only `allocation_id` and `task` drive resolution; the remaining fields
/// are kept for audit and for handlers that scope requests to the
/// workload's own namespace and job.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub allocation_id: String,

    pub task: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub job_id: String,

    /// Subject, `<region>:<namespace>:<job>:<group>:<task>:<identity>`.
    pub sub: String,

    /// Expiration (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

impl fmt::Debug for IdentityClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityClaims")
            .field("allocation_id", &self.allocation_id)
            .field("task", &self.task)
            .field("namespace", &self.namespace)
            .field("job_id", &self.job_id)
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .finish()
    }
}
