//! Retry tuning for both phases.
//!
//! Defaults can be overridden per value from the environment:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `NETCFG_SOURCE_RETRY_COUNT` | 3 |
//! | `NETCFG_SOURCE_RETRY_TIMEOUT` | 60 |
//! | `NETCFG_SOURCE_RETRY_DELAY` | 10 |
//! | `NETCFG_TARGET_RETRY_COUNT` | 3 |
//! | `NETCFG_TARGET_RETRY_TIMEOUT` | 800 |
//! | `NETCFG_TARGET_RETRY_DELAY` | 200 |
//!
//! Timeouts and delays are whole seconds. Unset or blank variables keep
//! the default.

use std::time::Duration;

use netcfg_reconcile::RetryPolicy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Retry policies for the source and target phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    pub source: RetryPolicy,
    pub target: RetryPolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            source: RetryPolicy::new(3, Duration::from_secs(60), Duration::from_secs(10)),
            target: RetryPolicy::new(3, Duration::from_secs(800), Duration::from_secs(200)),
        }
    }
}

impl ReconcilerConfig {
    pub fn with_source(mut self, policy: RetryPolicy) -> Self {
        self.source = policy;
        self
    }

    pub fn with_target(mut self, policy: RetryPolicy) -> Self {
        self.target = policy;
        self
    }

    /// Defaults overridden by `NETCFG_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns per variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            source: policy_from(&lookup, "NETCFG_SOURCE", defaults.source)?,
            target: policy_from(&lookup, "NETCFG_TARGET", defaults.target)?,
        })
    }
}

fn policy_from(
    lookup: &impl Fn(&str) -> Option<String>,
    prefix: &str,
    default: RetryPolicy,
) -> Result<RetryPolicy, ConfigError> {
    let count = read(lookup, &format!("{}_RETRY_COUNT", prefix))?;
    let timeout = read(lookup, &format!("{}_RETRY_TIMEOUT", prefix))?;
    let delay = read(lookup, &format!("{}_RETRY_DELAY", prefix))?;

    Ok(RetryPolicy {
        max_attempts: count.unwrap_or(default.max_attempts),
        max_elapsed: timeout.map(Duration::from_secs).unwrap_or(default.max_elapsed),
        delay: delay.map(Duration::from_secs).unwrap_or(default.delay),
    })
}

fn read<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    let value = match lookup(name) {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Ok(None),
    };
    match value.trim().parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(reason) => Err(ConfigError::Invalid {
            name: name.to_string(),
            value,
            reason,
        }),
    }
}
