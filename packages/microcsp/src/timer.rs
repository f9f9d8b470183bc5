// timers: one-shot delays, and a recurring timer source built out of them.

use crate::{
    mint::SourceId,
    promise::Promise,
    scheduler::{Liveness, Process, Scheduler},
};
use std::{
    fmt::{self, Debug, Formatter},
    time::{Duration, Instant},
};


// one-shot delay. registered with the scheduler as a processable. on each tick, checks whether
// the deadline has strictly passed, and if so delivers its promise and finishes, which removes it
// from the scheduler.
pub(crate) struct Delay {
    created: Instant,
    duration: Duration,
    promise: Promise<()>,
}

impl Delay {
    // construct delay starting now, along with the consumer side of its promise.
    pub(crate) fn new(duration: Duration) -> (Self, Promise<()>) {
        let promise = Promise::new();
        let delay = Delay {
            created: Instant::now(),
            duration,
            promise: promise.share(),
        };
        (delay, promise)
    }
}

impl Process for Delay {
    fn process(&self) -> Liveness {
        if self.created.elapsed() > self.duration {
            self.promise.deliver(());
            Liveness::Finished
        } else {
            Liveness::Live
        }
    }
}


/// Recurring timer source
///
/// A [`Scheduler::delay`] is not reusable once it fires. A `Timer` instead hands out a fresh delay
/// of the same period on every [`get`](Self::get), so a task can await it in a loop as if it were a
/// channel that produces a value every period. It can also be passed to
/// [`select`](crate::select), for example to race a timeout against a channel.
///
/// Created by [`Scheduler::timer`].
#[derive(Clone)]
pub struct Timer {
    id: SourceId,
    period: Duration,
    scheduler: Scheduler,
}

impl Timer {
    pub(crate) fn new(scheduler: Scheduler, period: Duration) -> Self {
        Timer {
            id: SourceId::mint(),
            period,
            scheduler,
        }
    }

    /// Pending operation which resolves one period from now
    pub fn get(&self) -> Promise<()> {
        self.scheduler.delay(self.period)
    }

    /// This timer's identity
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// This timer's period
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Debug for Timer {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("period", &self.period)
            .finish()
    }
}
