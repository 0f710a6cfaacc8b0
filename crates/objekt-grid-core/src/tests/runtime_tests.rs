use crate::{DefaultScheduler, Runtime, RuntimeScheduler};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

#[derive(Default)]
struct CountingScheduler {
    frames: AtomicUsize,
}

impl RuntimeScheduler for CountingScheduler {
    fn schedule_frame(&self) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

/// Future that stays pending until the shared flag is raised.
struct Gate {
    open: Rc<Cell<bool>>,
}

impl Future for Gate {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.open.get() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

#[test]
fn spawned_future_runs_when_drained() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let log = Rc::new(RefCell::new(Vec::new()));

    let log_task = Rc::clone(&log);
    handle.spawn_ui(async move {
        log_task.borrow_mut().push("ran");
    });

    assert!(log.borrow().is_empty());
    assert!(runtime.needs_frame());
    handle.drain_ui();
    assert_eq!(*log.borrow(), vec!["ran"]);
    assert!(!handle.has_pending_ui());
    assert!(!runtime.needs_frame());
}

#[test]
fn pending_future_is_repolled_until_ready() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let open = Rc::new(Cell::new(false));
    let done = Rc::new(Cell::new(false));

    let gate = Gate {
        open: Rc::clone(&open),
    };
    let done_task = Rc::clone(&done);
    handle.spawn_ui(async move {
        gate.await;
        done_task.set(true);
    });

    handle.drain_ui();
    assert!(!done.get());
    assert!(handle.has_pending_ui());

    open.set(true);
    handle.drain_ui();
    assert!(done.get());
    assert!(!handle.has_pending_ui());
}

#[test]
fn cancelled_task_never_completes() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let open = Rc::new(Cell::new(false));
    let done = Rc::new(Cell::new(false));

    let gate = Gate {
        open: Rc::clone(&open),
    };
    let done_task = Rc::clone(&done);
    let task = handle
        .spawn_ui(async move {
            gate.await;
            done_task.set(true);
        })
        .expect("runtime alive");

    handle.drain_ui();
    task.cancel();
    open.set(true);
    handle.drain_ui();

    assert!(!done.get());
    assert!(!handle.has_pending_ui());
}

#[test]
fn local_tasks_run_in_fifo_order() {
    let scheduler = Arc::new(CountingScheduler::default());
    let runtime = Runtime::new(scheduler.clone());
    let handle = runtime.handle();
    let order = Rc::new(RefCell::new(Vec::new()));

    for label in ["first", "second", "third"] {
        let order = Rc::clone(&order);
        handle.enqueue_ui_task(Box::new(move || order.borrow_mut().push(label)));
    }

    assert_eq!(scheduler.frames.load(Ordering::SeqCst), 3);
    handle.drain_ui();
    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn handle_outliving_runtime_is_inert() {
    let handle = {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        runtime.handle()
    };

    assert!(!handle.is_alive());
    assert!(handle.spawn_ui(async {}).is_none());
    handle.drain_ui();

    let ran = Rc::new(Cell::new(false));
    let ran_task = Rc::clone(&ran);
    handle.enqueue_ui_task(Box::new(move || ran_task.set(true)));
    assert!(ran.get());
}
