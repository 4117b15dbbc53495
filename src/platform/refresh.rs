//! Single-flight status refresh.
//!
//! Any number of callers may ask for fresh data at the same time, but the
//! controller is polled at most once at a time. Everyone who asked while a
//! poll was running receives that poll's outcome.

use crate::accessory::AccessoryStateStore;
use crate::controller::{DeviceStatus, PoolController};
use crate::error::ControllerError;
use futures_util::FutureExt;
use log::{debug, error, warn};
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Result of one status fetch, shared by every waiter of that fetch.
///
/// Failures are values: callers get `Err` but are never panicked at.
pub type RefreshOutcome = Result<Arc<DeviceStatus>, Arc<ControllerError>>;

type Waiter = oneshot::Sender<RefreshOutcome>;

#[derive(Default)]
struct RefreshQueue {
    waiters: Vec<Waiter>,
    in_flight: bool,
}

/// Coalesces concurrent refresh requests into one controller poll.
pub struct RefreshCoalescer {
    controller: Arc<dyn PoolController>,
    store: Arc<AccessoryStateStore>,
    /// Covers enqueue-and-trigger as well as apply-and-drain
    queue: Mutex<RefreshQueue>,
}

impl RefreshCoalescer {
    pub fn new(
        controller: Arc<dyn PoolController>,
        store: Arc<AccessoryStateStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            controller,
            store,
            queue: Mutex::new(RefreshQueue::default()),
        })
    }

    /// Request fresh status.
    ///
    /// Starts a fetch if none is running, otherwise joins the running one.
    /// The fetch runs on its own task, so dropping the returned future does
    /// not cancel it for the other waiters.
    pub async fn request_refresh(self: &Arc<Self>) -> RefreshOutcome {
        let (tx, rx) = oneshot::channel();

        let start_fetch = {
            let mut queue = self.queue.lock();
            queue.waiters.push(tx);
            if queue.in_flight {
                debug!(
                    "[Refresh] Queueing pending waiter. length: {}",
                    queue.waiters.len()
                );
                false
            } else {
                queue.in_flight = true;
                true
            }
        };

        if start_fetch {
            let guard = FetchGuard {
                coalescer: Arc::clone(self),
                armed: true,
            };
            tokio::spawn(guard.run());
        }

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(Arc::new(ControllerError::Interrupted)),
        }
    }

    /// Whether a status fetch is currently running.
    pub fn is_in_flight(&self) -> bool {
        self.queue.lock().in_flight
    }

    /// Number of callers waiting on the running fetch.
    pub fn pending_waiters(&self) -> usize {
        self.queue.lock().waiters.len()
    }

    async fn poll_controller(&self) -> RefreshOutcome {
        let fetched = AssertUnwindSafe(self.controller.get_status())
            .catch_unwind()
            .await;

        match fetched {
            Ok(Ok(status)) => Ok(Arc::new(status)),
            Ok(Err(err)) => {
                error!("[Refresh] Error getting pool status: {}", err);
                Err(Arc::new(err))
            }
            Err(_) => {
                error!("[Refresh] Status fetch panicked");
                Err(Arc::new(ControllerError::Interrupted))
            }
        }
    }

    /// Apply `outcome` to the store and hand it to everyone waiting.
    fn resolve(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut queue = self.queue.lock();
            self.store.apply(outcome.as_deref().map_err(|e| &**e));
            queue.in_flight = false;
            std::mem::take(&mut queue.waiters)
        };

        debug!("[Refresh] Resolving {} waiter(s)", waiters.len());
        for waiter in waiters {
            // Receiver gone means the caller stopped waiting
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Owns the in-flight fetch.
///
/// Created before the fetch task is spawned. If the task is dropped without
/// finishing (runtime shutdown, never polled) the queue is still drained
/// with `Interrupted`, so the next request starts a new fetch.
struct FetchGuard {
    coalescer: Arc<RefreshCoalescer>,
    armed: bool,
}

impl FetchGuard {
    async fn run(mut self) {
        let outcome = self.coalescer.poll_controller().await;
        self.armed = false;
        self.coalescer.resolve(outcome);
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!("[Refresh] Status fetch dropped before completing");
            self.coalescer.resolve(Err(Arc::new(ControllerError::Interrupted)));
        }
    }
}
