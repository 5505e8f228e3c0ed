//! One pooled connection: a session stub plus pool bookkeeping.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tabstore_proto::{Handshake, RemoteError, Request, Response, Stub, StubError};

use crate::config::PoolConfig;
use crate::error::{Error, Result};

/// Monotonic connection ids, for log correlation.
static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Outcome classification for one call on a connection.
///
/// The dispatcher reconnects and retries once on `Transport`; a
/// `Remote` error leaves the connection pooled and is surfaced as-is.
#[derive(Debug)]
pub enum CallError {
    /// The session itself failed (network or framing layer).
    Transport(StubError),
    /// The service rejected the operation; the session is healthy.
    Remote(RemoteError),
}

/// Result of one call attempt against a borrowed connection.
pub type CallResult<T> = std::result::Result<T, CallError>;

/// A single connection to the store, exclusively owned by either one
/// caller (while borrowed) or the pool's idle queue (while idle).
#[derive(Debug)]
pub struct Conn {
    id: u64,
    stub: Stub,
    /// Set each time the connection is placed back in the idle queue.
    returned_at: Option<Instant>,
}

impl Conn {
    /// Dial and authenticate a new session within `connect_timeout`.
    pub(crate) async fn open(config: &PoolConfig) -> Result<Self> {
        let hello = Handshake {
            access_key: config.credentials.access_key.clone(),
            secret_key: config.credentials.secret_key.clone(),
        };
        let connect = Stub::connect(&config.addr, &hello);
        let stub = tokio::time::timeout(config.connect_timeout, connect)
            .await
            .map_err(|_| Error::Connect {
                addr: config.addr.clone(),
                source: StubError::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "connect timed out",
                )),
            })?
            .map_err(|source| Error::Connect {
                addr: config.addr.clone(),
                source,
            })?;

        let id = NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(conn = id, addr = %config.addr, "opened connection");
        Ok(Self {
            id,
            stub,
            returned_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cheap, best-effort liveness hint (see [`Stub::is_open`]).
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.stub.is_open()
    }

    /// Close the session. Idempotent and absorbing: a failing close is
    /// logged and ignored, since the connection is being discarded
    /// regardless.
    pub async fn close(&mut self) {
        if let Err(error) = self.stub.close().await {
            tracing::warn!(conn = self.id, %error, "closing session failed");
        }
    }

    /// Run one request/response exchange and classify the outcome.
    pub async fn call(&mut self, request: &Request) -> CallResult<Response> {
        match self.stub.call(request).await {
            Ok(Response::Error(remote)) => Err(CallError::Remote(remote)),
            Ok(response) => Ok(response),
            Err(source) => Err(CallError::Transport(source)),
        }
    }

    pub(crate) fn mark_returned(&mut self) {
        self.returned_at = Some(Instant::now());
    }

    /// Whether this connection has sat in the idle queue longer than
    /// `idle_timeout`. Only meaningful while idle.
    pub(crate) fn idle_expired(&self, idle_timeout: Duration) -> bool {
        self.returned_at
            .is_some_and(|returned| returned.elapsed() >= idle_timeout)
    }
}
