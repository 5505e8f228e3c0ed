//! Client handle and lifecycle.

use std::time::Duration;

use crate::config::Options;
use crate::error::{Error, Result};
use crate::pool::Pool;

/// Grace period used by [`Client::close`] when no operation timeout is
/// configured.
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Pooled client for the tabular store.
///
/// One instance serves a whole process; it is `Send + Sync` and every
/// operation takes `&self`. Cloning is not offered, share it behind an
/// `Arc` (or use [`crate::proxy::Proxy`]).
#[derive(Debug)]
pub struct Client {
    pool: Pool,
    options: Options,
}

impl Client {
    /// Validate `options`, bring up the pool, and return a ready
    /// client.
    pub async fn connect(options: Options) -> Result<Self> {
        options.validate()?;
        let pool = Pool::open(options.pool.clone()).await?;
        tracing::info!(addr = %options.pool.addr, "client connected");
        Ok(Self { pool, options })
    }

    /// Stop the pool, then wait one grace period so borrowed
    /// connections can be released and closed.
    ///
    /// The grace is the configured operation timeout, or
    /// [`DEFAULT_CLOSE_GRACE`] when none is set.
    pub async fn close(&self) {
        let grace = self.options.operation_timeout.unwrap_or(DEFAULT_CLOSE_GRACE);
        self.soft_close(grace).await;
    }

    /// Stop the pool, then wait the given grace period.
    pub async fn soft_close(&self, grace: Duration) {
        self.pool.stop().await;
        tokio::time::sleep(grace).await;
        tracing::info!("client closed");
    }

    /// Stop the pool immediately, without any grace period.
    ///
    /// # Errors
    /// [`Error::PoolClosed`] if the client is already closed.
    pub async fn hard_close(&self) -> Result<()> {
        if !self.pool.is_open() {
            return Err(Error::PoolClosed);
        }
        self.pool.stop().await;
        tracing::info!("client closed");
        Ok(())
    }

    /// Reopen a closed client. Connections are created lazily on the
    /// next operation.
    ///
    /// # Errors
    /// [`Error::PoolAlreadyOpen`] if the client is not closed.
    pub fn open(&self) -> Result<()> {
        if self.pool.is_open() {
            return Err(Error::PoolAlreadyOpen);
        }
        self.pool.resume();
        tracing::info!("client reopened");
        Ok(())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.pool.is_open()
    }

    #[must_use]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }
}
