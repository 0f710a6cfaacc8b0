//! Blocking work on a worker thread, awaited from the UI thread.
//!
//! [`run_in_background`] starts `work` on a fresh thread and returns a
//! [`BackgroundTask`] future. Polling it from a task spawned with
//! [`RuntimeHandle::spawn_ui`](crate::RuntimeHandle::spawn_ui) resumes on the
//! UI thread once the worker is done, so continuations may touch `Rc` state.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

/// Cooperative cancellation token passed into background work.
///
/// The token flips to "cancelled" when the [`BackgroundTask`] awaiting the
/// work is dropped. Long-running work should check
/// [`CancelToken::is_cancelled`] and exit early; blocking I/O is not
/// interrupted automatically.
#[derive(Clone, Debug)]
pub struct CancelToken {
    active: Arc<AtomicBool>,
}

impl CancelToken {
    fn new(active: Arc<AtomicBool>) -> Self {
        Self { active }
    }

    /// Returns `true` once the awaiting side has gone away.
    pub fn is_cancelled(&self) -> bool {
        !self.active.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// The worker thread ended without producing a value (it panicked).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerLost;

impl fmt::Display for WorkerLost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "background worker exited without a result")
    }
}

impl std::error::Error for WorkerLost {}

struct Slot<T> {
    value: Option<T>,
    finished: bool,
    waker: Option<Waker>,
}

fn lock<T>(slot: &Mutex<Slot<T>>) -> MutexGuard<'_, Slot<T>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks the slot finished even when the worker unwinds.
struct CompletionGuard<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> CompletionGuard<T> {
    fn complete(self, value: T) {
        lock(&self.slot).value = Some(value);
        // Drop runs next and wakes the UI side.
    }
}

impl<T> Drop for CompletionGuard<T> {
    fn drop(&mut self) {
        let waker = {
            let mut slot = lock(&self.slot);
            slot.finished = true;
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Future resolving to the value produced by a background worker.
pub struct BackgroundTask<T> {
    slot: Arc<Mutex<Slot<T>>>,
    active: Arc<AtomicBool>,
}

impl<T> fmt::Debug for BackgroundTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundTask")
            .field("finished", &lock(&self.slot).finished)
            .finish()
    }
}

impl<T> Future for BackgroundTask<T> {
    type Output = Result<T, WorkerLost>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = lock(&self.slot);
        if let Some(value) = slot.value.take() {
            return Poll::Ready(Ok(value));
        }
        if slot.finished {
            return Poll::Ready(Err(WorkerLost));
        }
        slot.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl<T> Drop for BackgroundTask<T> {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Runs `work` on a worker thread.
///
/// `work` receives a [`CancelToken`] that reports cancellation once the
/// returned future is dropped.
pub fn run_in_background<T, Work>(work: Work) -> BackgroundTask<T>
where
    T: Send + 'static,
    Work: FnOnce(CancelToken) -> T + Send + 'static,
{
    let slot = Arc::new(Mutex::new(Slot {
        value: None,
        finished: false,
        waker: None,
    }));
    let active = Arc::new(AtomicBool::new(true));

    let guard = CompletionGuard {
        slot: Arc::clone(&slot),
    };
    let token = CancelToken::new(Arc::clone(&active));
    std::thread::spawn(move || {
        let value = work(token.clone());
        if token.is_cancelled() {
            log::trace!("background result dropped: awaiting task went away");
            return;
        }
        guard.complete(value);
    });

    BackgroundTask { slot, active }
}
