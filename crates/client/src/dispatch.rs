//! Retry-wrapped dispatch of operations over pooled connections.
//!
//! Every public operation funnels through [`Client::execute`]: acquire
//! a connection, run the operation, and classify the outcome. A
//! transport failure earns exactly one reconnect-and-retry on a fresh
//! connection; a remote rejection is surfaced as-is and never retried,
//! since the session itself is healthy.

use std::time::Instant;

use futures::future::BoxFuture;

use crate::client::Client;
use crate::conn::{CallError, Conn};
use crate::error::{Error, Result};
use tabstore_proto::{RemoteError, StubError};

enum AttemptError {
    Transport(StubError),
    Remote(RemoteError),
    Timeout,
}

impl Client {
    /// Run `op` on a pooled connection with the single-retry contract.
    ///
    /// `op` is invoked at most twice, each time on a connection it may
    /// use exclusively for the duration of the call. The configured
    /// operation timeout, when set, bounds the whole dispatch: it
    /// tightens the acquire deadline and caps each attempt.
    pub(crate) async fn execute<T, F>(&self, mut op: F) -> Result<T>
    where
        F: for<'c> FnMut(&'c mut Conn) -> BoxFuture<'c, crate::conn::CallResult<T>>,
    {
        let started = Instant::now();
        let deadline = self
            .options()
            .operation_timeout
            .map(|timeout| started + timeout);
        let mut acquire_deadline = started + self.options().pool.acquire_timeout;
        if let Some(deadline) = deadline {
            acquire_deadline = acquire_deadline.min(deadline);
        }

        let mut conn = self.pool().acquire_until(acquire_deadline).await?;
        let first = match attempt(&mut conn, &mut op, deadline).await {
            Ok(value) => {
                self.pool().release(conn, true).await;
                return Ok(value);
            }
            Err(AttemptError::Remote(remote)) => {
                // The exchange itself completed; keep the session.
                self.pool().release(conn, true).await;
                return Err(Error::Remote(remote));
            }
            Err(AttemptError::Timeout) => {
                // A late response would desync the framing, so the
                // session cannot be reused.
                self.pool().release(conn, false).await;
                return Err(Error::Timeout {
                    elapsed: started.elapsed(),
                });
            }
            Err(AttemptError::Transport(source)) => source,
        };

        tracing::debug!(
            conn = conn.id(),
            error = %first,
            "transport failure, reconnecting for one retry"
        );
        let mut fresh = self.pool().invalidate_and_replace(conn).await?;
        match attempt(&mut fresh, &mut op, deadline).await {
            Ok(value) => {
                self.pool().release(fresh, true).await;
                Ok(value)
            }
            Err(AttemptError::Remote(remote)) => {
                self.pool().release(fresh, true).await;
                Err(Error::Remote(remote))
            }
            Err(AttemptError::Timeout) => {
                self.pool().release(fresh, false).await;
                Err(Error::Timeout {
                    elapsed: started.elapsed(),
                })
            }
            Err(AttemptError::Transport(source)) => {
                self.pool().release(fresh, false).await;
                Err(Error::Transport { source })
            }
        }
    }
}

/// One bounded attempt of `op` against `conn`.
async fn attempt<T, F>(
    conn: &mut Conn,
    op: &mut F,
    deadline: Option<Instant>,
) -> std::result::Result<T, AttemptError>
where
    F: for<'c> FnMut(&'c mut Conn) -> BoxFuture<'c, crate::conn::CallResult<T>>,
{
    let call = op(conn);
    let outcome = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline.into(), call).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(AttemptError::Timeout),
        },
        None => call.await,
    };
    match outcome {
        Ok(value) => Ok(value),
        Err(CallError::Transport(source)) => Err(AttemptError::Transport(source)),
        Err(CallError::Remote(remote)) => Err(AttemptError::Remote(remote)),
    }
}
