// single-assignment delivery cell.
//
// every pending operation in the runtime (a get, a put, a delay, a task's eventual result) is
// represented by one of these. the producer side (a channel, a timer, the scheduler) keeps a
// crate-internal shared handle and calls deliver at most once with effect. the consumer side is
// the public, non-cloneable handle, which is a future resolving to the delivered value.

use crate::mint::PromiseId;
use std::{
    cell::RefCell,
    fmt::{self, Debug, Formatter},
    future::Future,
    hash::{Hash, Hasher},
    mem,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};


/// Single-assignment value container, awaitable from a task
///
/// Once delivered, a promise stays delivered: a second [`deliver`](Self::deliver) is a no-op that
/// returns false and keeps the first value. Equality is identity: two promises are equal only if
/// they are the same promise.
///
/// Awaiting a promise moves the delivered value out of it. The public handle is not `Clone`, so
/// there is exactly one consumer for every pending operation.
pub struct Promise<T> {
    id: PromiseId,
    slot: Rc<RefCell<Slot<T>>>,
}

struct Slot<T> {
    state: State<T>,
    // waker of the task that most recently polled this promise while it was pending.
    waker: Option<Waker>,
}

enum State<T> {
    Pending,
    Delivered(T),
    // delivered, and the value has since been moved out by the consumer.
    Taken,
}

impl<T> Promise<T> {
    /// Construct an undelivered promise
    pub fn new() -> Self {
        Promise {
            id: PromiseId::mint(),
            slot: Rc::new(RefCell::new(Slot {
                state: State::Pending,
                waker: None,
            })),
        }
    }

    /// Construct a promise which is already delivered with `value`
    pub fn ready(value: T) -> Self {
        let promise = Promise::new();
        promise.deliver(value);
        promise
    }

    /// This promise's identity
    pub fn id(&self) -> PromiseId {
        self.id
    }

    /// Deliver a value into this promise
    ///
    /// Returns true and stores the value if the promise was not yet delivered. Otherwise, returns
    /// false without changing anything. Delivering wakes the task waiting on this promise, if any.
    pub fn deliver(&self, value: T) -> bool {
        let waker = {
            let mut slot = self.slot.borrow_mut();
            if !matches!(slot.state, State::Pending) {
                return false;
            }
            slot.state = State::Delivered(value);
            slot.waker.take()
        };
        // woken outside of the borrow, in case the waker re-enters this promise
        if let Some(waker) = waker {
            waker.wake();
        }
        true
    }

    /// Whether a value has been delivered into this promise
    pub fn is_delivered(&self) -> bool {
        !matches!(self.slot.borrow().state, State::Pending)
    }

    /// Clone of the delivered value
    ///
    /// Returns `None` if the promise is not yet delivered, or if the value was already moved out by
    /// awaiting or [`try_take`](Self::try_take).
    pub fn value(&self) -> Option<T>
    where
        T: Clone,
    {
        match &self.slot.borrow().state {
            State::Delivered(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Move the delivered value out of this promise, if it is delivered and not yet taken
    pub fn try_take(&mut self) -> Option<T> {
        let mut slot = self.slot.borrow_mut();
        match mem::replace(&mut slot.state, State::Taken) {
            State::Delivered(value) => Some(value),
            State::Pending => {
                slot.state = State::Pending;
                None
            }
            State::Taken => None,
        }
    }

    // another handle to the same cell, for the producer side.
    pub(crate) fn share(&self) -> Self {
        Promise {
            id: self.id,
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T> Future for Promise<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<T> {
        let mut slot = self.slot.borrow_mut();
        match mem::replace(&mut slot.state, State::Taken) {
            State::Delivered(value) => Poll::Ready(value),
            State::Pending => {
                slot.state = State::Pending;
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
            State::Taken => panic!("promise polled after its value was already taken"),
        }
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Promise::new()
    }
}

impl<T> PartialEq for Promise<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Promise<T> {}

impl<T> Hash for Promise<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Debug for Promise<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let state = match self.slot.borrow().state {
            State::Pending => "pending",
            State::Delivered(_) => "delivered",
            State::Taken => "taken",
        };
        f.debug_struct("Promise")
            .field("id", &self.id)
            .field("state", &state)
            .finish()
    }
}
