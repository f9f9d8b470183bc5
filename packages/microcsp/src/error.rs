// error types.
//
// channel saturation and closure are not errors: a put resolves to false and a get resolves to
// None, and callers check those values. the only failure the runtime reports as an error is a task
// body dying.

use thiserror::Error;


/// Error for a task whose body did not run to completion
#[derive(Error, Debug, Clone, Eq, PartialEq, Hash)]
pub enum TaskError {
    /// The task's body panicked while being resumed
    ///
    /// Contains the panic message, if it was a string.
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Eventual outcome of a spawned task
///
/// See [`Scheduler::spawn`](crate::Scheduler::spawn).
pub type TaskResult<T> = Result<T, TaskError>;
