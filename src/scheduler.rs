//! The worker context that drives purge timers.
//!
//! Callers use the bus from plain threads, and a runtime that happens to be
//! current while the bus is built may be gone long before the bus is. Unless
//! a runtime is handed over explicitly, the timers get a runtime of their own.

use crate::Result;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Name of the worker thread of an owned purge runtime
pub const PURGE_THREAD_NAME: &str = "weak-events-purge";

/// Runtime created by the scheduler itself.
///
/// Shut down in the background on drop so that dropping a bus from inside
/// an async context does not panic.
struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            debug!("Shutting down owned purge runtime");
            runtime.shutdown_background();
        }
    }
}

/// Spawns purge timers on a tokio runtime.
#[derive(Clone)]
pub struct PurgeScheduler {
    handle: Handle,
    owned: Option<Arc<OwnedRuntime>>,
}

impl PurgeScheduler {
    /// Use the runtime behind `handle`.
    ///
    /// The runtime must have its time driver enabled and must outlive every
    /// bus using this scheduler: once it shuts down, no bucket is swept again.
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            owned: None,
        }
    }

    /// Start a dedicated single-worker runtime.
    pub fn owned() -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(PURGE_THREAD_NAME)
            .enable_time()
            .build()?;

        info!("Started owned purge runtime");

        Ok(Self {
            handle: runtime.handle().clone(),
            owned: Some(Arc::new(OwnedRuntime(Some(runtime)))),
        })
    }

    /// Whether this scheduler started its own runtime
    pub fn is_owned(&self) -> bool {
        self.owned.is_some()
    }

    pub(crate) fn spawn<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(task)
    }
}

impl fmt::Debug for PurgeScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurgeScheduler")
            .field("owned", &self.is_owned())
            .finish()
    }
}
