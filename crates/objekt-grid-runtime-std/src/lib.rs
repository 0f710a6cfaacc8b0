//! Standard runtime services backed by Rust's `std` library.
//!
//! [`StdRuntime`] pairs an [`objekt_grid_core::Runtime`] with a scheduler that
//! records frame requests and can wake a sleeping host loop, which is what a
//! headless driver needs to wait for background page fetches.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use web_time::Duration;

use objekt_grid_core::{Runtime, RuntimeHandle, RuntimeScheduler};

/// Frame scheduler for a host loop built on `std` threads.
///
/// Every request bumps a counter. Polling ([`take_frame_request`]) and
/// sleeping ([`wait_for_frame`]) each remember the last count they saw, so
/// a host may use either or both.
///
/// [`take_frame_request`]: StdScheduler::take_frame_request
/// [`wait_for_frame`]: StdScheduler::wait_for_frame
#[derive(Default)]
pub struct StdScheduler {
    requests: Mutex<u64>,
    wakeup: Condvar,
    taken: AtomicU64,
    waited: AtomicU64,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn requests(&self) -> MutexGuard<'_, u64> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns whether a frame has been requested since the last call.
    pub fn take_frame_request(&self) -> bool {
        let current = *self.requests();
        self.taken.swap(current, Ordering::SeqCst) != current
    }

    /// Blocks until a frame is requested or `timeout` elapses.
    ///
    /// Returns `true` when a request arrived since the previous wait.
    pub fn wait_for_frame(&self, timeout: Duration) -> bool {
        let seen = self.waited.load(Ordering::SeqCst);
        let (requests, _) = self
            .wakeup
            .wait_timeout_while(self.requests(), timeout, |count| *count == seen)
            .unwrap_or_else(PoisonError::into_inner);
        if *requests == seen {
            return false;
        }
        self.waited.store(*requests, Ordering::SeqCst);
        true
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("requests", &*self.requests())
            .field("taken", &self.taken.load(Ordering::SeqCst))
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn schedule_frame(&self) {
        *self.requests() += 1;
        self.wakeup.notify_all();
    }
}

/// Convenience container bundling the standard scheduler and a runtime.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self { scheduler, runtime }
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn take_frame_request(&self) -> bool {
        self.scheduler.take_frame_request()
    }

    /// Sleeps until the runtime asks for a frame, then drains it.
    ///
    /// Returns `false` if nothing arrived within `timeout`.
    pub fn pump(&self, timeout: Duration) -> bool {
        let woke = self.scheduler.wait_for_frame(timeout);
        self.scheduler.take_frame_request();
        self.runtime.handle().drain_ui();
        woke
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/std_runtime_tests.rs"]
mod tests;
