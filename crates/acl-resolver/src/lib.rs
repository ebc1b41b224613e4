//! ACL resolver library.
//!
//! Maps every incoming control-plane RPC to a verifiable identity and, when
//! ACL enforcement is enabled, to a compiled ACL:
//!
//! - Registered worker nodes (by connection or node secret)
//! - ACL tokens, including the anonymous and leader sentinels
//! - Signed workload identities of live allocations
//! - Peer servers, by TLS name and remote IP
//!
//! # Architecture
//!
//! ```text
//! services::AclResolver -> acl (compile + cache) -> state::StateSnapshot
//!                       -> auth::ClaimVerifier
//!                       -> leader::LeaderAclReceiver
//! ```
//!
//! This layer produces identities and ACL objects; RPC handlers enforce them.
//!
//! # Modules
//!
//! - `acl` - Compiled ACL objects and the shared cache
//! - `auth` - Workload identity claims and verification
//! - `config` - Configuration from environment
//! - `errors` - Error types
//! - `leader` - Leader ACL secret tracking
//! - `models` - Tokens, policies, roles, allocations, nodes, identities
//! - `rpc` - Per-request transport facts
//! - `services` - The resolver entry points
//! - `state` - Snapshot-based state access

pub mod acl;
pub mod auth;
pub mod config;
pub mod errors;
pub mod leader;
pub mod models;
pub mod rpc;
pub mod services;
pub mod state;

pub use errors::AuthError;
pub use services::AclResolver;
