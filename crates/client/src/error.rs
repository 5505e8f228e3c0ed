//! Error types for the pooled client.

use std::time::Duration;

use tabstore_proto::{RemoteError, StubError};
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the client can surface.
///
/// Callers can distinguish "try again later" ([`Error::PoolExhausted`])
/// from connectivity problems ([`Error::Connect`], [`Error::Transport`])
/// from rejections by the service itself ([`Error::Remote`]).
#[derive(Debug, Error)]
pub enum Error {
    /// Client or pool configuration is invalid.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// What is wrong with the configuration.
        message: String,
    },

    /// The pool is stopped and not accepting acquires.
    #[error("connection pool is closed")]
    PoolClosed,

    /// A resume was requested on a pool that is already open.
    #[error("connection pool is already open")]
    PoolAlreadyOpen,

    /// No connection became available before the acquire deadline.
    #[error("connection pool exhausted: no connection became available within {waited:?}")]
    PoolExhausted {
        /// How long the caller waited.
        waited: Duration,
    },

    /// Dialing or authenticating a new session failed.
    #[error("connecting to {addr} failed: {source}")]
    Connect {
        /// The endpoint that was dialed.
        addr: String,
        #[source]
        source: StubError,
    },

    /// A pooled connection failed its liveness check.
    #[error("connection failed liveness check")]
    DeadConnection,

    /// A transport failure that survived the single reconnect-and-retry.
    #[error("transport failure persisted after reconnect retry: {source}")]
    Transport {
        #[source]
        source: StubError,
    },

    /// The configured operation deadline passed mid-call.
    #[error("operation deadline exceeded after {elapsed:?}")]
    Timeout {
        /// Time spent before giving up.
        elapsed: Duration,
    },

    /// Application-level rejection from the remote service. Never
    /// retried by the client; the session stays pooled.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The server answered with a response shape the operation cannot
    /// accept. Indicates a server bug or version skew.
    #[error("protocol violation in {operation}: unexpected {got} response")]
    Protocol {
        operation: &'static str,
        got: &'static str,
    },

    /// The proxy was used before `init` completed.
    #[error("proxy is not initialized")]
    ProxyUninitialized,
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
