//! Error types for a reconciliation run.

use std::num::ParseIntError;

use netcfg_endpoint::AccessError;
use netcfg_reconcile::RetryError;
use thiserror::Error;

/// Terminal failure of a run, per phase.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Reading the desired rules failed for good.
    #[error("source phase failed after {attempts} attempt(s): {cause}")]
    Source {
        attempts: u32,
        #[source]
        cause: AccessError,
    },

    /// Reading or updating the target failed for good.
    #[error("target phase failed after {attempts} attempt(s): {cause}")]
    Target {
        attempts: u32,
        #[source]
        cause: AccessError,
    },
}

impl ReconcileError {
    pub(crate) fn source(err: RetryError<AccessError>) -> Self {
        Self::Source {
            attempts: err.attempts(),
            cause: err.into_cause(),
        }
    }

    pub(crate) fn target(err: RetryError<AccessError>) -> Self {
        Self::Target {
            attempts: err.attempts(),
            cause: err.into_cause(),
        }
    }

    /// Attempts made in the failing phase.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Source { attempts, .. } | Self::Target { attempts, .. } => *attempts,
        }
    }

    /// The last error the failing phase saw.
    pub fn cause(&self) -> &AccessError {
        match self {
            Self::Source { cause, .. } | Self::Target { cause, .. } => cause,
        }
    }
}

/// Invalid tuning value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: String,
        value: String,
        #[source]
        reason: ParseIntError,
    },
}

/// Result type for reconciliation runs.
pub type Result<T> = std::result::Result<T, ReconcileError>;
