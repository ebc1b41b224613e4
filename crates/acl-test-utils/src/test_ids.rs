//! Fixed test IDs for deterministic tests
//!
//! Secrets are well-formed UUIDs so they pass the secret format check and
//! reach the state store.

// ACL token secrets (1-99)
pub const TEST_SECRET_CLIENT: &str = "00000000-0000-0000-0000-000000000001";
pub const TEST_SECRET_MANAGEMENT: &str = "00000000-0000-0000-0000-000000000002";
pub const TEST_SECRET_EXPIRED: &str = "00000000-0000-0000-0000-000000000003";
pub const TEST_SECRET_UNKNOWN: &str = "00000000-0000-0000-0000-000000000099";

// Leader secret (100)
pub const TEST_LEADER_SECRET: &str = "00000000-0000-0000-0000-000000000100";

// Node secrets and IDs (200-299)
pub const TEST_NODE_SECRET: &str = "00000000-0000-0000-0000-000000000200";
pub const TEST_NODE_ID: &str = "00000000-0000-0000-0000-000000000201";

// Allocation IDs (300-399)
pub const TEST_ALLOC_ID: &str = "00000000-0000-0000-0000-000000000300";
pub const TEST_ALLOC_ID_TERMINAL: &str = "00000000-0000-0000-0000-000000000301";
pub const TEST_ALLOC_ID_MISSING: &str = "00000000-0000-0000-0000-000000000399";

// Role IDs (400-499)
pub const TEST_ROLE_ID: &str = "00000000-0000-0000-0000-000000000400";
pub const TEST_ROLE_ID_MISSING: &str = "00000000-0000-0000-0000-000000000499";

// Accessor IDs
pub const TEST_ACCESSOR_CLIENT: &str = "accessor-client";
pub const TEST_ACCESSOR_MANAGEMENT: &str = "accessor-management";
pub const TEST_ACCESSOR_EXPIRED: &str = "accessor-expired";

// Signing key IDs
pub const TEST_KEY_ID_1: &str = "test-key-2025-01";
pub const TEST_KEY_ID_2: &str = "test-key-2025-02";

// Job layout of the mock allocation
pub const TEST_NAMESPACE: &str = "default";
pub const TEST_JOB_ID: &str = "example";
pub const TEST_TASK_GROUP: &str = "web";
pub const TEST_TASK: &str = "web";
