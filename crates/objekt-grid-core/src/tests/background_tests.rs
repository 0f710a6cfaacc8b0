use crate::{run_in_background, DefaultScheduler, Runtime, WorkerLost};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn drain_until<F: Fn() -> bool>(handle: &crate::RuntimeHandle, done: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "background work did not finish");
        handle.drain_ui();
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn background_value_is_delivered_on_ui_thread() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let result = Rc::new(RefCell::new(None));

    let result_task = Rc::clone(&result);
    handle.spawn_ui(async move {
        let value = run_in_background(|_token| 6 * 7).await;
        *result_task.borrow_mut() = Some(value);
    });

    drain_until(&handle, || result.borrow().is_some());
    assert_eq!(*result.borrow(), Some(Ok(42)));
}

#[test]
fn panicking_worker_reports_worker_lost() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let result: Rc<RefCell<Option<Result<u32, WorkerLost>>>> = Rc::new(RefCell::new(None));

    let result_task = Rc::clone(&result);
    handle.spawn_ui(async move {
        let value = run_in_background(|_token| -> u32 { panic!("worker failure") }).await;
        *result_task.borrow_mut() = Some(value);
    });

    drain_until(&handle, || result.borrow().is_some());
    assert_eq!(*result.borrow(), Some(Err(WorkerLost)));
}

#[test]
fn dropping_task_cancels_token() {
    let (tx, rx) = std::sync::mpsc::channel();
    let task = run_in_background(move |token| {
        while token.is_active() {
            std::thread::sleep(Duration::from_millis(1));
        }
        let _ = tx.send(token.is_cancelled());
    });
    drop(task);
    let observed = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("worker observed cancellation");
    assert!(observed);
}
