//! Retry policy for a reconciliation phase.
//!
//! A phase is retried on recoverable errors until either the attempt budget
//! or the elapsed-time budget runs out. The wait between attempts is fixed.
//! Fatal errors stop immediately.
//!
//! The time budget is checked after a failed attempt and before sleeping, so
//! a phase never starts sleeping once its budget is spent, but one attempt
//! may still run past the budget.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use netcfg_endpoint::AccessError;
use thiserror::Error;

/// Classifies errors as worth retrying or not.
pub trait Recoverable {
    fn is_recoverable(&self) -> bool;
}

impl Recoverable for AccessError {
    fn is_recoverable(&self) -> bool {
        AccessError::is_recoverable(self)
    }
}

/// Attempt and time budget for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first included. Zero behaves as one.
    pub max_attempts: u32,

    /// Total time after which no further attempt starts.
    #[serde(with = "seconds")]
    pub max_elapsed: Duration,

    /// Fixed wait between attempts.
    #[serde(with = "seconds")]
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, max_elapsed: Duration, delay: Duration) -> Self {
        Self {
            max_attempts,
            max_elapsed,
            delay,
        }
    }

    /// A single attempt with no waiting.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Run `operation` under this policy.
    ///
    /// `operation` receives the 1-based attempt number. `phase` names the
    /// work in log events.
    pub fn run<T, E, F>(&self, phase: &str, mut operation: F) -> Result<Retried<T>, RetryError<E>>
    where
        E: Recoverable + fmt::Display + fmt::Debug,
        F: FnMut(u32) -> Result<T, E>,
    {
        let max_attempts = self.max_attempts.max(1);
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let cause = match operation(attempt) {
                Ok(value) => {
                    return Ok(Retried {
                        value,
                        attempts: attempt,
                    })
                }
                Err(cause) => cause,
            };

            if !cause.is_recoverable() {
                tracing::warn!(phase, attempt, error = %cause, "fatal failure, not retrying");
                return Err(RetryError::Fatal {
                    attempts: attempt,
                    cause,
                });
            }

            if attempt >= max_attempts || started.elapsed() >= self.max_elapsed {
                tracing::warn!(
                    phase,
                    attempts = attempt,
                    elapsed_ms = millis(started.elapsed()),
                    error = %cause,
                    "retry budget exhausted"
                );
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    cause,
                });
            }

            tracing::warn!(
                phase,
                attempt,
                max_attempts,
                delay_ms = millis(self.delay),
                error = %cause,
                "recoverable failure, retrying"
            );
            thread::sleep(self.delay);
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A successful result and the attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// Why a retried operation gave up.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: fmt::Display + fmt::Debug,
{
    /// A non-recoverable error ended the run.
    #[error("fatal error on attempt {attempts}: {cause}")]
    Fatal { attempts: u32, cause: E },

    /// Recoverable errors used up the attempt or time budget.
    #[error("gave up after {attempts} attempts: {cause}")]
    Exhausted { attempts: u32, cause: E },
}

impl<E> RetryError<E>
where
    E: fmt::Display + fmt::Debug,
{
    /// Attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Fatal { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// The last error seen.
    pub fn cause(&self) -> &E {
        match self {
            Self::Fatal { cause, .. } | Self::Exhausted { cause, .. } => cause,
        }
    }

    pub fn into_cause(self) -> E {
        match self {
            Self::Fatal { cause, .. } | Self::Exhausted { cause, .. } => cause,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Serde adapter storing a `Duration` as whole seconds.
mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
