//! Bounded connection pool with background idle eviction.
//!
//! The pool owns an idle queue, a live-connection count, and an
//! open/stopped flag. Callers borrow a [`Conn`] via [`Pool::acquire`],
//! hand it back with [`Pool::release`], and swap a broken one for a
//! fresh one with [`Pool::invalidate_and_replace`]. Structural state is
//! guarded by one mutex; dials and closes never run under it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinSet;

use crate::config::PoolConfig;
use crate::conn::Conn;
use crate::error::{Error, Result};

/// Floor for the eviction loop interval.
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(120);

/// Cap on connections created eagerly at construction.
const PREWARM_MAX: u32 = 10;

const STATUS_STOPPED: u8 = 0;
const STATUS_OPEN: u8 = 1;

struct PoolInner {
    config: PoolConfig,
    /// Idle connections, most recently returned at the front.
    idle: Mutex<VecDeque<Conn>>,
    /// Connections created and not yet closed, idle or borrowed.
    live: AtomicI32,
    status: AtomicU8,
}

impl PoolInner {
    fn is_open(&self) -> bool {
        self.status.load(Ordering::SeqCst) == STATUS_OPEN
    }
}

/// Concurrency-safe, bounded pool of connections to one endpoint.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("addr", &self.inner.config.addr)
            .field("live", &self.live_count())
            .field("idle", &self.idle_count())
            .field("open", &self.is_open())
            .finish()
    }
}

impl Pool {
    /// Create an open pool, pre-warm it, and start the eviction loop.
    ///
    /// Pre-warming dials `min(max_connections, 10)` connections
    /// concurrently; failures are logged and tolerated, so a pool can
    /// come up while the endpoint is still unreachable.
    pub async fn open(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        let capacity = config.max_connections as usize;
        let pool = Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(VecDeque::with_capacity(capacity)),
                live: AtomicI32::new(0),
                status: AtomicU8::new(STATUS_OPEN),
                config,
            }),
        };
        pool.prewarm().await;

        let interval = pool.inner.config.idle_timeout.max(HOUSEKEEPING_INTERVAL);
        tokio::spawn(housekeeping(Arc::downgrade(&pool.inner), interval));
        Ok(pool)
    }

    /// Borrow a connection, waiting up to the configured acquire
    /// timeout for capacity.
    pub async fn acquire(&self) -> Result<Conn> {
        self.acquire_until(Instant::now() + self.inner.config.acquire_timeout)
            .await
    }

    /// Borrow a connection, waiting until `deadline` at the latest.
    ///
    /// # Errors
    /// - [`Error::PoolClosed`] when the pool is stopped (fails fast,
    ///   no waiting).
    /// - [`Error::PoolExhausted`] when the deadline passes while the
    ///   pool is at capacity with nothing idle.
    /// - [`Error::Connect`] when creating a fresh connection fails.
    /// - [`Error::DeadConnection`] when the vetted connection is dead;
    ///   the caller may simply acquire again.
    pub async fn acquire_until(&self, deadline: Instant) -> Result<Conn> {
        let inner = &self.inner;
        if !inner.is_open() {
            return Err(Error::PoolClosed);
        }
        let started = Instant::now();

        // Iterative wait, never recursive: sustained contention must
        // not grow the stack.
        loop {
            enum Claim {
                Idle(Conn),
                Slot,
                Full,
                Closed,
            }
            let claim = {
                let mut idle = inner.idle.lock();
                // Status re-checked under the lock: stop() resets the
                // live count, so a slot reserved after the entry check
                // raced a stop would never be given back.
                if !inner.is_open() {
                    Claim::Closed
                } else if let Some(conn) = idle.pop_front() {
                    Claim::Idle(conn)
                } else if inner.live.load(Ordering::SeqCst)
                    < inner.config.max_connections as i32
                {
                    // Reserve the slot before the slow dial so a burst
                    // of concurrent acquirers cannot overshoot the cap.
                    // Rolled back in dial() if the dial fails.
                    inner.live.fetch_add(1, Ordering::SeqCst);
                    Claim::Slot
                } else {
                    Claim::Full
                }
            };

            match claim {
                Claim::Idle(conn) => return self.vet(conn).await,
                Claim::Slot => return self.dial().await,
                Claim::Full => {}
                Claim::Closed => return Err(Error::PoolClosed),
            }

            // At capacity with nothing idle: sleep and re-check.
            tokio::time::sleep(inner.config.retry_interval).await;
            if Instant::now() >= deadline {
                let waited = started.elapsed();
                tracing::debug!(?waited, "pool exhausted");
                return Err(Error::PoolExhausted { waited });
            }
            if !inner.is_open() {
                return Err(Error::PoolClosed);
            }
        }
    }

    /// Hand a borrowed connection back.
    ///
    /// Pass `valid = false` when the caller knows the connection is
    /// unusable. Never fails: close problems are absorbed.
    pub async fn release(&self, mut conn: Conn, valid: bool) {
        let inner = &self.inner;
        if !inner.is_open() {
            // stop() already reset the live count; just make sure the
            // session dies instead of re-entering the queue.
            conn.close().await;
            return;
        }

        // The over-cap branch tolerates a transient shrink of
        // max_connections; normal flow never takes it.
        let over_cap = inner.live.load(Ordering::SeqCst) > inner.config.max_connections as i32;
        if !valid || over_cap || !conn.is_alive() {
            inner.live.fetch_sub(1, Ordering::SeqCst);
            tracing::debug!(conn = conn.id(), valid, "discarding connection on release");
            conn.close().await;
            return;
        }

        conn.mark_returned();
        // Most recent at the front, oldest at the back: the eviction
        // scan below relies on this strict recency (LIFO) order to
        // stop at the first unexpired entry. Switching to FIFO
        // insertion requires reworking evict_idle_expired().
        inner.idle.lock().push_front(conn);
    }

    /// Close a broken connection and dial its replacement.
    ///
    /// The broken connection's slot carries over to the replacement;
    /// the live count rolls back only if the replacement fails.
    pub async fn invalidate_and_replace(&self, mut conn: Conn) -> Result<Conn> {
        tracing::debug!(conn = conn.id(), "invalidating connection");
        conn.close().await;
        if !self.inner.is_open() {
            return Err(Error::PoolClosed);
        }
        self.dial().await
    }

    /// Close idle connections that have exceeded the idle timeout.
    ///
    /// Scans from the least recently returned end and stops at the
    /// first entry still within budget; each close happens outside the
    /// lock. Runs from the background loop, public so callers can
    /// force a sweep.
    pub async fn evict_idle_expired(&self) {
        let inner = &self.inner;
        loop {
            let expired = {
                let mut idle = inner.idle.lock();
                match idle.back() {
                    Some(conn) if conn.idle_expired(inner.config.idle_timeout) => idle.pop_back(),
                    _ => None,
                }
            };
            let Some(mut conn) = expired else { break };
            conn.close().await;
            inner.live.fetch_sub(1, Ordering::SeqCst);
            tracing::debug!(conn = conn.id(), "evicted idle connection");
        }
    }

    /// Stop the pool: refuse new acquires, close everything idle,
    /// reset the live count. Idempotent.
    ///
    /// Borrowed connections are not reclaimed; they are closed when
    /// their holders release them.
    pub async fn stop(&self) {
        let inner = &self.inner;
        // Same lock as the acquire claim: the status flip and count
        // reset are atomic with respect to slot reservation.
        let drained = {
            let mut idle = inner.idle.lock();
            inner.status.store(STATUS_STOPPED, Ordering::SeqCst);
            inner.live.store(0, Ordering::SeqCst);
            std::mem::take(&mut *idle)
        };
        let closed = drained.len();
        for mut conn in drained {
            conn.close().await;
        }
        tracing::debug!(closed, "pool stopped");
    }

    /// Reopen a stopped pool. Connections are created lazily on the
    /// next acquire; there is no re-pre-warm.
    pub fn resume(&self) {
        self.inner.status.store(STATUS_OPEN, Ordering::SeqCst);
        tracing::debug!("pool resumed");
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    /// Number of idle connections right now.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().len()
    }

    /// Connections created and not yet closed, idle or borrowed.
    #[must_use]
    pub fn live_count(&self) -> u32 {
        self.inner.live.load(Ordering::SeqCst).max(0) as u32
    }

    /// Liveness gate for a connection about to be handed to a caller.
    async fn vet(&self, mut conn: Conn) -> Result<Conn> {
        if conn.is_alive() {
            return Ok(conn);
        }
        self.inner.live.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(conn = conn.id(), "pooled connection found dead");
        conn.close().await;
        Err(Error::DeadConnection)
    }

    /// Dial into an already-reserved slot, rolling the reservation back
    /// on failure.
    async fn dial(&self) -> Result<Conn> {
        match Conn::open(&self.inner.config).await {
            Ok(conn) if conn.is_alive() => Ok(conn),
            Ok(mut conn) => {
                self.inner.live.fetch_sub(1, Ordering::SeqCst);
                conn.close().await;
                Err(Error::DeadConnection)
            }
            Err(err) => {
                self.inner.live.fetch_sub(1, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    async fn prewarm(&self) {
        let target = self.inner.config.max_connections.min(PREWARM_MAX);
        let mut tasks = JoinSet::new();
        for _ in 0..target {
            let pool = self.clone();
            tasks.spawn(async move {
                match pool.acquire().await {
                    Ok(conn) => pool.release(conn, true).await,
                    Err(error) => tracing::warn!(%error, "pre-warm connection failed"),
                }
            });
        }
        while tasks.join_next().await.is_some() {}
        tracing::debug!(idle = self.idle_count(), "pool pre-warmed");
    }
}

/// Periodic idle eviction. Holds only a weak reference: stopping the
/// pool does not stop the loop (it no-ops on an empty queue), but
/// dropping the last pool handle ends it.
async fn housekeeping(inner: Weak<PoolInner>, interval: Duration) {
    loop {
        {
            let Some(inner) = inner.upgrade() else { break };
            Pool { inner }.evict_idle_expired().await;
        }
        tokio::time::sleep(interval).await;
    }
}
