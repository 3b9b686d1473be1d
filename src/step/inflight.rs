//! Counting join for concurrently running workers.
//!
//! Every dispatched worker holds an [`InFlightGuard`]; the step waits on
//! [`InFlightTracker::wait_idle`] until all guards have been dropped.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Tracks how many workers are still running.
#[derive(Debug, Default)]
pub struct InFlightTracker {
    in_flight: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one worker. The count drops when the guard is dropped.
    pub fn track(&self) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            counter: self.in_flight.clone(),
            notify: self.notify.clone(),
        }
    }

    /// Current number of live guards.
    pub fn count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until every guard handed out so far has been dropped.
    pub async fn wait_idle(&self) {
        while self.count() != 0 {
            self.notify.notified().await;
        }
    }
}

/// RAII guard for one in-flight worker.
#[derive(Debug)]
pub struct InFlightGuard {
    counter: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
        // notify_one stores a permit when nobody is waiting yet, so a drop
        // racing the count check in wait_idle is never lost.
        self.notify.notify_one();
    }
}
