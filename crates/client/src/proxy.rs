//! Late-binding access to a shared client.
//!
//! A [`Proxy`] lets modules register interest in the client before it
//! exists: callbacks queued via [`Proxy::register`] run once
//! [`Proxy::init`] has connected. The core has no singleton;
//! [`default_proxy`] is an optional process-wide instance for programs
//! that want one.

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

use crate::client::Client;
use crate::config::Options;
use crate::error::{Error, Result};

type Callback = Box<dyn Fn(Arc<Client>) -> Result<()> + Send + Sync>;

fn run_callback(callback: &dyn Fn(Arc<Client>) -> Result<()>, client: Arc<Client>) {
    if let Err(error) = callback(client) {
        tracing::error!(%error, "proxy callback failed");
    }
}

/// Holder for a lazily initialized, shared [`Client`].
pub struct Proxy {
    client: RwLock<Option<Arc<Client>>>,
    pending: Mutex<Vec<Callback>>,
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("initialized", &self.is_ok())
            .field("pending_callbacks", &self.pending.lock().len())
            .finish()
    }
}

impl Default for Proxy {
    fn default() -> Self {
        Self::new()
    }
}

impl Proxy {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            client: RwLock::new(None),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Queue `callback` to run when the proxy is initialized. If it
    /// already is, the callback runs immediately on the caller's task.
    ///
    /// A callback's error is logged and goes no further; it cannot
    /// fail registration or [`Proxy::init`].
    pub fn register(&self, callback: impl Fn(Arc<Client>) -> Result<()> + Send + Sync + 'static) {
        if let Some(client) = self.client.read().clone() {
            run_callback(&callback, client);
            return;
        }
        self.pending.lock().push(Box::new(callback));
    }

    /// Connect a client from `options`, install it, and run the queued
    /// callbacks.
    ///
    /// Callbacks run in registration order on the current task, or
    /// each on its own spawned task when
    /// [`Options::parallel_callbacks`] is set. A failing callback is
    /// logged and never fails the init. Calling `init` again replaces
    /// the previous client without closing it; holders of the old
    /// `Arc` keep a working client.
    pub async fn init(&self, options: Options) -> Result<()> {
        let parallel = options.parallel_callbacks;
        let client = Arc::new(Client::connect(options).await?);
        *self.client.write() = Some(Arc::clone(&client));

        let callbacks = std::mem::take(&mut *self.pending.lock());
        tracing::debug!(callbacks = callbacks.len(), parallel, "proxy initialized");
        for callback in callbacks {
            if parallel {
                let client = Arc::clone(&client);
                tokio::spawn(async move { run_callback(&*callback, client) });
            } else {
                run_callback(&*callback, Arc::clone(&client));
            }
        }
        Ok(())
    }

    /// Whether [`Proxy::init`] has completed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.client.read().is_some()
    }

    /// The installed client.
    ///
    /// # Errors
    /// [`Error::ProxyUninitialized`] before [`Proxy::init`] completes.
    pub fn client(&self) -> Result<Arc<Client>> {
        self.client.read().clone().ok_or(Error::ProxyUninitialized)
    }
}

/// Process-wide proxy for programs that want exactly one client.
pub fn default_proxy() -> &'static Proxy {
    static DEFAULT: OnceLock<Proxy> = OnceLock::new();
    DEFAULT.get_or_init(Proxy::new)
}
