//! The UI-thread runtime: a frame flag, a closure queue and a tiny executor.
//!
//! Nothing here is `Send`. A [`Runtime`] lives on the thread that created it
//! and only its [`RuntimeScheduler`] crosses threads (wakers use it to ask
//! the host for another frame).

use crate::platform::RuntimeScheduler;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::task::{Context, Waker};
use std::thread::ThreadId;

#[cfg(not(feature = "std-hash"))]
type TaskIdSet = rustc_hash::FxHashSet<TaskId>;
#[cfg(feature = "std-hash")]
type TaskIdSet = std::collections::HashSet<TaskId>;

type LocalTask = Box<dyn FnOnce() + 'static>;
type LocalFuture = Pin<Box<dyn Future<Output = ()> + 'static>>;

/// Identifies a future spawned with [`RuntimeHandle::spawn_ui`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Spawned futures, polled in spawn order.
struct Executor {
    next_id: Cell<u64>,
    parked: RefCell<BTreeMap<TaskId, LocalFuture>>,
    /// Cancelled while taken out of `parked` for a poll pass.
    cancelled_in_pass: RefCell<TaskIdSet>,
    waker: Waker,
}

impl Executor {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            next_id: Cell::new(1),
            parked: RefCell::new(BTreeMap::new()),
            cancelled_in_pass: RefCell::new(TaskIdSet::default()),
            waker: futures_task::waker(Arc::new(FrameWaker { scheduler })),
        }
    }

    fn spawn(&self, future: LocalFuture) -> TaskId {
        let id = TaskId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.parked.borrow_mut().insert(id, future);
        id
    }

    fn cancel(&self, id: TaskId) {
        let removed = self.parked.borrow_mut().remove(&id);
        match removed {
            // Dropped outside the borrow: a future's destructor may call back in.
            Some(future) => drop(future),
            None => {
                self.cancelled_in_pass.borrow_mut().insert(id);
            }
        }
    }

    /// Polls every parked future once. Returns whether any of them finished.
    fn poll_pass(&self) -> bool {
        let batch = std::mem::take(&mut *self.parked.borrow_mut());
        if batch.is_empty() {
            return false;
        }
        let mut cx = Context::from_waker(&self.waker);
        let mut finished = false;
        for (id, mut future) in batch {
            if self.cancelled_in_pass.borrow().contains(&id) {
                continue;
            }
            if future.as_mut().poll(&mut cx).is_ready() {
                finished = true;
                continue;
            }
            // The future may have cancelled itself through its own handle.
            if !self.cancelled_in_pass.borrow().contains(&id) {
                self.parked.borrow_mut().insert(id, future);
            }
        }
        self.cancelled_in_pass.borrow_mut().clear();
        finished
    }

    fn len(&self) -> Option<usize> {
        self.parked.try_borrow().ok().map(|parked| parked.len())
    }
}

/// Wakes spawned futures by asking the host for a frame.
struct FrameWaker {
    scheduler: Arc<dyn RuntimeScheduler>,
}

impl futures_task::ArcWake for FrameWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.scheduler.schedule_frame();
    }
}

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_frame: Cell<bool>,
    ui_thread: ThreadId,
    local: RefCell<VecDeque<LocalTask>>,
    executor: Executor,
}

impl RuntimeInner {
    fn schedule(&self) {
        self.needs_frame.set(true);
        self.scheduler.schedule_frame();
    }

    fn run_local_tasks(&self) -> bool {
        let mut ran = false;
        // Pop one at a time: a task may enqueue more.
        while let Some(task) = self.local.borrow_mut().pop_front() {
            task();
            ran = true;
        }
        ran
    }

    fn drain(&self) {
        debug_assert_eq!(
            std::thread::current().id(),
            self.ui_thread,
            "runtime drained off its UI thread"
        );
        loop {
            let ran_local = self.run_local_tasks();
            let finished = self.executor.poll_pass();
            if !ran_local && !finished {
                break;
            }
        }
        if !self.has_pending() {
            self.needs_frame.set(false);
        }
    }

    fn has_pending(&self) -> bool {
        let local = self
            .local
            .try_borrow()
            .map(|queue| !queue.is_empty())
            .unwrap_or(true);
        local || self.executor.len().map_or(true, |len| len > 0)
    }
}

/// Owner of the UI-thread runtime. Dropping the last clone invalidates every
/// [`RuntimeHandle`].
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        let executor = Executor::new(Arc::clone(&scheduler));
        Self {
            inner: Rc::new(RuntimeInner {
                scheduler,
                needs_frame: Cell::new(false),
                ui_thread: std::thread::current().id(),
                local: RefCell::new(VecDeque::new()),
                executor,
            }),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether work was queued since the last drain left nothing pending.
    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("needs_frame", &self.inner.needs_frame.get())
            .field("spawned", &self.inner.executor.len())
            .finish()
    }
}

/// Weak, cloneable access to a [`Runtime`].
///
/// Every method degrades to a no-op once the runtime is gone, so state
/// objects may outlive the runtime that spawned their work.
#[derive(Clone)]
pub struct RuntimeHandle {
    inner: Weak<RuntimeInner>,
}

impl RuntimeHandle {
    /// Asks the host for a frame.
    pub fn schedule(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.schedule();
        }
    }

    /// Queues a closure for the next drain. The closure may capture `Rc`
    /// state; it never leaves the UI thread.
    ///
    /// Runs immediately when the runtime has already been dropped.
    pub fn enqueue_ui_task(&self, task: Box<dyn FnOnce() + 'static>) {
        match self.inner.upgrade() {
            Some(inner) => {
                inner.local.borrow_mut().push_back(task);
                inner.schedule();
            }
            None => task(),
        }
    }

    /// Spawns a future polled on the UI thread during [`drain_ui`](Self::drain_ui).
    ///
    /// The future is not polled until then. Returns `None` when the runtime
    /// is gone.
    pub fn spawn_ui<F>(&self, future: F) -> Option<TaskHandle>
    where
        F: Future<Output = ()> + 'static,
    {
        let inner = self.inner.upgrade()?;
        let id = inner.executor.spawn(Box::pin(future));
        inner.schedule();
        Some(TaskHandle {
            id,
            runtime: self.clone(),
        })
    }

    /// Runs queued closures and polls spawned futures until a pass makes no
    /// progress.
    pub fn drain_ui(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.drain();
        }
    }

    pub fn has_pending_ui(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.has_pending())
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    fn cancel_task(&self, id: TaskId) {
        if let Some(inner) = self.inner.upgrade() {
            log::trace!("{id} cancelled");
            inner.executor.cancel(id);
        }
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Handle to a future spawned with [`RuntimeHandle::spawn_ui`].
///
/// Dropping the handle detaches the task; [`cancel`](Self::cancel) drops
/// the future so it never resumes.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    runtime: RuntimeHandle,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn cancel(self) {
        self.runtime.cancel_task(self.id);
    }
}

/// Scheduler for hosts that drain on their own cadence.
#[derive(Debug, Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}
