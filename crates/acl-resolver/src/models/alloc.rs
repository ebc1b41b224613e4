//! Allocation and node records, reduced to what identity resolution reads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the scheduler wants the allocation to be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocDesiredStatus {
    Run,
    Stop,
    Evict,
}

/// What the client reports the allocation is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocClientStatus {
    Pending,
    Running,
    Complete,
    Failed,
    Lost,
    Unknown,
}

/// Reference to the job an allocation was placed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRef {
    pub id: String,

    #[serde(default)]
    pub name: String,
}

/// One placement of a task group on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: String,
    pub namespace: String,

    /// Missing only for records written by very old or broken servers.
    #[serde(default)]
    pub job: Option<JobRef>,

    pub task_group: String,

    #[serde(default)]
    pub node_id: String,

    pub desired_status: AllocDesiredStatus,
    pub client_status: AllocClientStatus,
}

impl Allocation {
    /// True once the allocation has stopped or been told to stop.
    ///
    /// Workload identities issued to a terminal allocation are dead: its
    /// backing lease no longer exists.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.desired_status,
            AllocDesiredStatus::Stop | AllocDesiredStatus::Evict
        ) || matches!(
            self.client_status,
            AllocClientStatus::Complete | AllocClientStatus::Failed | AllocClientStatus::Lost
        )
    }
}

/// A registered client node. The `secret_id` is redacted in Debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub secret_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub datacenter: String,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("secret_id", &"[REDACTED]")
            .field("name", &self.name)
            .field("datacenter", &self.datacenter)
            .finish()
    }
}
