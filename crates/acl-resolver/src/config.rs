//! ACL resolver configuration.
//!
//! Configuration is loaded from environment variables.

use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default number of compiled ACL objects kept in the cache.
pub const DEFAULT_ACL_CACHE_CAPACITY: u64 = 512;

/// Default region name.
pub const DEFAULT_REGION: &str = "global";

/// ACL resolver configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether ACL enforcement is enabled cluster-wide (default: false).
    pub acl_enabled: bool,

    /// Maximum number of compiled ACL objects held in the shared cache.
    pub acl_cache_capacity: u64,

    /// Clock skew tolerance in seconds for workload identity `iat` checks.
    pub clock_skew_seconds: u64,

    /// Region this server belongs to.
    pub region: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            acl_enabled: false,
            acl_cache_capacity: DEFAULT_ACL_CACHE_CAPACITY,
            clock_skew_seconds: DEFAULT_CLOCK_SKEW.as_secs(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid ACL_ENABLED configuration: {0}")]
    InvalidAclEnabled(String),

    #[error("Invalid ACL cache capacity configuration: {0}")]
    InvalidCacheCapacity(String),

    #[error("Invalid clock skew configuration: {0}")]
    InvalidClockSkew(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let acl_enabled = match vars.get("ACL_ENABLED").map(|v| v.trim().to_ascii_lowercase()) {
            None => false,
            Some(value) => match value.as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::InvalidAclEnabled(format!(
                        "ACL_ENABLED must be true or false, got '{}'",
                        value
                    )))
                }
            },
        };

        let acl_cache_capacity = if let Some(value_str) = vars.get("ACL_CACHE_CAPACITY") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidCacheCapacity(format!(
                    "ACL_CACHE_CAPACITY must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidCacheCapacity(
                    "ACL_CACHE_CAPACITY must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_ACL_CACHE_CAPACITY
        };

        let clock_skew_seconds =
            if let Some(value_str) = vars.get("WORKLOAD_IDENTITY_CLOCK_SKEW_SECONDS") {
                let value: i64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidClockSkew(format!(
                        "WORKLOAD_IDENTITY_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value <= 0 {
                    return Err(ConfigError::InvalidClockSkew(format!(
                        "WORKLOAD_IDENTITY_CLOCK_SKEW_SECONDS must be positive, got {}",
                        value
                    )));
                }

                let value = value.unsigned_abs();
                if value > MAX_CLOCK_SKEW.as_secs() {
                    return Err(ConfigError::InvalidClockSkew(format!(
                        "WORKLOAD_IDENTITY_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                        MAX_CLOCK_SKEW.as_secs(),
                        value
                    )));
                }

                value
            } else {
                DEFAULT_CLOCK_SKEW.as_secs()
            };

        let region = vars
            .get("REGION")
            .cloned()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Config {
            acl_enabled,
            acl_cache_capacity,
            clock_skew_seconds,
            region,
        })
    }
}
