//! Scoped sessions over an endpoint.
//!
//! A [`Session`] owns an opened endpoint and closes it when dropped, so
//! every exit path (success, error, panic unwinding) releases the
//! connection. Use [`Session::finish`] to observe close failures.

use std::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::traits::Endpoint;

/// An open endpoint, closed on drop.
pub struct Session<E: Endpoint> {
    endpoint: E,
    closed: bool,
}

impl<E: Endpoint> Session<E> {
    /// Open `endpoint`. On failure the endpoint is dropped unopened.
    pub fn open(mut endpoint: E) -> Result<Self> {
        endpoint.open()?;
        Ok(Self {
            endpoint,
            closed: false,
        })
    }

    /// Close the session, reporting any close error.
    pub fn finish(mut self) -> Result<()> {
        self.closed = true;
        self.endpoint.close()
    }
}

impl<E: Endpoint> Deref for Session<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.endpoint
    }
}

impl<E: Endpoint> DerefMut for Session<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.endpoint
    }
}

impl<E: Endpoint> Drop for Session<E> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.endpoint.close() {
            tracing::warn!(error = %err, "failed to close endpoint session");
        }
    }
}
