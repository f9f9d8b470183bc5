// spawned tasks.
//
// a task is a type-erased future plus a readiness flag. the flag is the task's waker: promises
// store the waker of whoever polls them while pending and wake it on delivery, which sets the
// flag. so a task is "parked" exactly while the flag is clear, meaning the pending operation it
// last awaited has not been delivered yet.

use crate::error::TaskError;
use futures::{
    future::LocalBoxFuture,
    task::{waker_ref, ArcWake},
};
use std::{
    any::Any,
    future::Future,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering::Relaxed},
        Arc,
    },
    task::{Context, Poll},
};


pub(crate) struct Task {
    // none only while the scheduler has it taken out for polling.
    pub(crate) future: Option<LocalBoxFuture<'static, ()>>,
    pub(crate) waker: Arc<TaskWaker>,
    // delivers a failure into the task's result promise.
    on_panic: Box<dyn FnOnce(TaskError)>,
}

impl Task {
    pub(crate) fn new(
        future: LocalBoxFuture<'static, ()>,
        on_panic: Box<dyn FnOnce(TaskError)>,
    ) -> Self {
        Task {
            future: Some(future),
            // a fresh task has nothing to wait for, so it starts out ready
            waker: Arc::new(TaskWaker { ready: AtomicBool::new(true) }),
            on_panic,
        }
    }

    // if the task is ready, clear the flag and return true.
    pub(crate) fn take_ready(&self) -> bool {
        self.waker.ready.swap(false, Relaxed)
    }

    pub(crate) fn is_parked(&self) -> bool {
        !self.waker.ready.load(Relaxed)
    }

    // consume the task, reporting the failure through its result promise.
    pub(crate) fn fail(self, error: TaskError) {
        (self.on_panic)(error);
    }
}


// the waker of a task. only ever touched from the scheduler's thread, but Waker requires
// Send + Sync, hence the atomic.
pub(crate) struct TaskWaker {
    ready: AtomicBool,
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.ready.store(true, Relaxed);
    }
}


// outcome of resuming a task once.
pub(crate) enum Step {
    // suspended on a pending operation.
    Parked,
    // ran to completion. its result has been delivered.
    Completed,
    // the body panicked. contains the panic message.
    Panicked(String),
}

// resume the future until it suspends, completes, or panics. panics do not propagate.
pub(crate) fn step(future: &mut LocalBoxFuture<'static, ()>, waker: &Arc<TaskWaker>) -> Step {
    let waker = waker_ref(waker);
    let mut cx = Context::from_waker(&waker);
    match panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx))) {
        Ok(Poll::Pending) => Step::Parked,
        Ok(Poll::Ready(())) => Step::Completed,
        Err(payload) => Step::Panicked(panic_message(payload)),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(&message) = payload.downcast_ref::<&'static str>() {
        message.to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::promise::Promise;
    use futures::FutureExt;
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn parking_follows_the_awaited_promise() {
        let wait_on = Promise::new();
        let producer = wait_on.share();
        let mut task = Task::new(
            async move { wait_on.await }.boxed_local(),
            Box::new(|_: TaskError| ()),
        );
        assert!(!task.is_parked());

        let mut future = task.future.take().unwrap();
        assert!(task.take_ready());
        assert!(matches!(step(&mut future, &task.waker), Step::Parked));
        assert!(task.is_parked());

        producer.deliver(());
        assert!(!task.is_parked());
        assert!(task.take_ready());
        assert!(matches!(step(&mut future, &task.waker), Step::Completed));
    }

    #[test]
    fn panic_is_captured() {
        let failed = Rc::new(Cell::new(None));
        let report = failed.clone();
        let mut task = Task::new(
            async { panic!("boom") }.boxed_local(),
            Box::new(move |error: TaskError| report.set(Some(error))),
        );
        let mut future = task.future.take().unwrap();
        match step(&mut future, &task.waker) {
            Step::Panicked(message) => task.fail(TaskError::Panicked(message)),
            _ => panic!("expected the body to panic"),
        }
        assert_eq!(failed.take(), Some(TaskError::Panicked("boom".to_owned())));
    }
}
