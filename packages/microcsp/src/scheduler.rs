// the scheduler: registries of live channels, timers, and tasks, and the tick that advances them.

use crate::{
    config::Config,
    error::{TaskError, TaskResult},
    mint::SourceId,
    promise::Promise,
    task::{self, Step, Task},
    timer::{Delay, Timer},
};
use futures::FutureExt;
use generational_arena::{Arena, Index};
use smallvec::SmallVec;
use std::{
    cell::{Cell, RefCell},
    fmt::{self, Debug, Formatter},
    future::Future,
    mem,
    rc::Rc,
    thread,
    time::Duration,
};


// something the scheduler runs a process step on every tick, before advancing tasks.
pub(crate) trait Process {
    fn process(&self) -> Liveness;
}

// whether a processable stays registered after its process step.
pub(crate) enum Liveness {
    Live,
    Finished,
}


/// Handle to a cooperative, single-threaded scheduler
///
/// The scheduler is the single point of forward progress: no channel operation, delay, or task
/// result resolves except as a side effect of a [`tick`](Self::tick). Each tick:
///
/// 1. runs the process step of every live channel and timer, in registration order, and drops
///    timers that fired.
/// 2. resumes every live task, in registration order, whose awaited pending operation has been
///    delivered. A task that completes delivers its result and leaves the live set.
///
/// Channels, timers, and tasks created during a tick are first processed on the next tick.
///
/// Handles are cheap to clone and all refer to the same scheduler. Task bodies typically hold one
/// so they can create channels and spawn further tasks.
#[derive(Clone)]
pub struct Scheduler(Rc<Shared>);

struct Shared {
    config: Config,
    // channels and timers, in registration order.
    processables: RefCell<Vec<(SourceId, Rc<dyn Process>)>>,
    // live tasks.
    tasks: RefCell<Arena<Task>>,
    // arena indices of live tasks, in registration order.
    task_order: RefCell<Vec<Index>>,
    // number of completed ticks.
    ticks: Cell<u64>,
}

impl Scheduler {
    /// Create a scheduler with the default [`Config`]
    pub fn new() -> Self {
        Scheduler::with_config(Config::default())
    }

    /// Create a scheduler with the given configuration
    pub fn with_config(config: Config) -> Self {
        Scheduler(Rc::new(Shared {
            config,
            processables: RefCell::new(Vec::new()),
            tasks: RefCell::new(Arena::new()),
            task_order: RefCell::new(Vec::new()),
            ticks: Cell::new(0),
        }))
    }

    /// This scheduler's configuration
    pub fn config(&self) -> &Config {
        &self.0.config
    }

    // add a channel or timer to the live set.
    pub(crate) fn register(&self, id: SourceId, processable: Rc<dyn Process>) {
        self.0.processables.borrow_mut().push((id, processable));
    }

    /// Remove a channel or timer from the live set
    ///
    /// The channel's pending and future operations will never resolve afterwards, and tasks
    /// waiting on them stay parked. Returns false if nothing with that id was registered.
    pub fn deregister(&self, id: SourceId) -> bool {
        let mut processables = self.0.processables.borrow_mut();
        let before = processables.len();
        processables.retain(|&(other, _)| other != id);
        let removed = processables.len() != before;
        if removed {
            debug!(?id, "deregistered");
        }
        removed
    }

    /// Launch a task
    ///
    /// The task first runs on the next tick. Returns the pending result of the task, which is
    /// delivered when the body completes, or with [`TaskError::Panicked`] if it panics. A panic
    /// never escapes into the scheduler.
    pub fn spawn<F>(&self, future: F) -> Promise<TaskResult<F::Output>>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let result = Promise::new();
        let on_complete = result.share();
        let on_panic = result.share();
        let task = Task::new(
            async move {
                let output = future.await;
                on_complete.deliver(Ok(output));
            }
            .boxed_local(),
            Box::new(move |error: TaskError| {
                on_panic.deliver(Err(error));
            }),
        );
        let idx = self.0.tasks.borrow_mut().insert(task);
        self.0.task_order.borrow_mut().push(idx);
        trace!(task = ?idx, "spawned task");
        result
    }

    /// Launch a plain, non-suspending function as a task
    ///
    /// It runs and completes on the task's first step.
    pub fn spawn_fn<F, T>(&self, f: F) -> Promise<TaskResult<T>>
    where
        F: FnOnce() -> T + 'static,
        T: 'static,
    {
        self.spawn(async move { f() })
    }

    /// Pending operation which resolves once `duration` has elapsed
    ///
    /// Resolves on the first tick strictly after the deadline. A delay is one-shot.
    pub fn delay(&self, duration: Duration) -> Promise<()> {
        let id = SourceId::mint();
        let (delay, promise) = Delay::new(duration);
        self.register(id, Rc::new(delay));
        promise
    }

    /// Pending operation which resolves on the next tick
    ///
    /// Awaiting this gives up the rest of the current tick. Polling loops, such as tasks bridging
    /// hardware flags into channels, use this between polls.
    pub fn yield_now(&self) -> Promise<()> {
        self.delay(Duration::ZERO)
    }

    /// Create a recurring timer source of the given period
    pub fn timer(&self, period: Duration) -> Timer {
        Timer::new(self.clone(), period)
    }

    /// Run one tick
    pub fn tick(&self) {
        let tick = self.0.ticks.get() + 1;
        self.0.ticks.set(tick);
        self.process_all();
        let resumed = self.advance_tasks();
        trace!(tick, resumed, "tick done");
    }

    // step 1: process every live channel and timer, dropping the ones that finished.
    fn process_all(&self) {
        let snapshot = self.0.processables.borrow().clone();
        let mut finished = SmallVec::<[SourceId; 4]>::new();
        for (id, processable) in snapshot {
            if let Liveness::Finished = processable.process() {
                finished.push(id);
            }
        }
        if !finished.is_empty() {
            self.0.processables.borrow_mut().retain(|(id, _)| !finished.contains(id));
        }
    }

    // step 2: resume every live task which is not parked. returns how many were resumed.
    fn advance_tasks(&self) -> usize {
        let order = self.0.task_order.borrow().clone();
        let mut resumed = 0;
        for idx in order {
            // take the future out of the arena, so that the body may freely spawn tasks and create
            // channels while it runs
            let taken = {
                let mut tasks = self.0.tasks.borrow_mut();
                match tasks.get_mut(idx) {
                    Some(task) if task.take_ready() => {
                        task.future.take().map(|future| (future, task.waker.clone()))
                    }
                    _ => None,
                }
            };
            let Some((mut future, waker)) = taken else { continue };
            resumed += 1;

            match task::step(&mut future, &waker) {
                Step::Parked => {
                    // a task spawned after a shutdown during the step must keep its own future
                    if let Some(task) = self.0.tasks.borrow_mut().get_mut(idx) {
                        if task.future.is_none() {
                            task.future = Some(future);
                        }
                    }
                }
                Step::Completed => {
                    self.remove_task(idx);
                    trace!(task = ?idx, "task completed");
                }
                Step::Panicked(message) => {
                    error!(task = ?idx, %message, "task panicked");
                    if let Some(task) = self.remove_task(idx) {
                        task.fail(TaskError::Panicked(message));
                    }
                }
            }
        }
        resumed
    }

    fn remove_task(&self, idx: Index) -> Option<Task> {
        self.0.task_order.borrow_mut().retain(|&other| other != idx);
        self.0.tasks.borrow_mut().remove(idx)
    }

    /// Tick forever, pausing [`Config::tick_interval`] between ticks
    pub fn run(&self) -> ! {
        debug!(interval = ?self.0.config.tick_interval, "scheduler loop started");
        loop {
            self.tick();
            self.pause();
        }
    }

    /// Tick, pausing [`Config::tick_interval`] between ticks, until `done` returns true after a
    /// tick
    ///
    /// For hosts that need to regain control, and for tests.
    pub fn run_until(&self, mut done: impl FnMut() -> bool) {
        loop {
            self.tick();
            if done() {
                return;
            }
            self.pause();
        }
    }

    fn pause(&self) {
        let interval = self.0.config.tick_interval;
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    /// Tick forever from within a tokio runtime, one tick per [`Config::tick_interval`]
    ///
    /// The scheduler is not `Send`, so this must be driven by a current-thread runtime's
    /// `block_on` or a `LocalSet`.
    #[cfg(feature = "tokio")]
    pub async fn drive(&self) {
        use tokio::time::{interval, MissedTickBehavior};

        let period = self.0.config.tick_interval;
        debug!(interval = ?period, "scheduler driver started");
        if period.is_zero() {
            loop {
                self.tick();
                tokio::task::yield_now().await;
            }
        } else {
            let mut interval = interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.tick();
            }
        }
    }

    /// Drop every live task, channel, and timer
    ///
    /// Tasks hold scheduler handles, so a scheduler with live tasks is never freed on its own.
    /// This breaks those cycles. Results of dropped tasks are never delivered.
    pub fn shutdown(&self) {
        // removed one by one rather than replacing the arena, so that indices of tasks spawned
        // afterwards never collide with the ones being dropped
        let tasks = {
            let mut arena = self.0.tasks.borrow_mut();
            let idxs = arena.iter().map(|(idx, _)| idx).collect::<Vec<_>>();
            idxs.into_iter().filter_map(|idx| arena.remove(idx)).collect::<Vec<_>>()
        };
        let processables = mem::take(&mut *self.0.processables.borrow_mut());
        self.0.task_order.borrow_mut().clear();
        debug!(tasks = tasks.len(), processables = processables.len(), "scheduler shut down");
        // dropped here, outside of any borrow, since dropping a task drops whatever its body held
        drop(tasks);
        drop(processables);
    }

    /// Number of live tasks
    pub fn live_tasks(&self) -> usize {
        self.0.task_order.borrow().len()
    }

    /// Number of live tasks that are parked on a pending operation
    pub fn parked_tasks(&self) -> usize {
        self.0.tasks.borrow().iter().filter(|(_, task)| task.is_parked()).count()
    }

    /// Number of live channels and timers
    pub fn live_processables(&self) -> usize {
        self.0.processables.borrow().len()
    }

    /// Number of ticks run so far
    pub fn ticks(&self) -> u64 {
        self.0.ticks.get()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}

impl Debug for Scheduler {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("ticks", &self.ticks())
            .field("live_tasks", &self.live_tasks())
            .field("live_processables", &self.live_processables())
            .finish()
    }
}


// ==== tests ====
