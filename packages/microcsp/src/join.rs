// sequential join of pending operations, and exposing a background task as a channel.

use crate::{
    channel::api::{Channel, ChannelKind},
    promise::Promise,
    scheduler::Scheduler,
};
use std::future::Future;


/// Await several pending operations, delivering all their results as one list
///
/// Despite the name, the operations are awaited one after the other, in the order given, by one
/// auxiliary task. This only sequences the awaiting: the operations are expected to be already
/// pending, so they progress concurrently anyway. The results are in the order given, regardless
/// of which operation actually resolved first.
pub fn do_all<T: 'static>(
    scheduler: &Scheduler,
    ops: impl IntoIterator<Item = Promise<T>>,
) -> Promise<Vec<T>> {
    let ops = ops.into_iter().collect::<Vec<_>>();
    let joined = Promise::new();
    let deliver_to = joined.share();
    scheduler.spawn(async move {
        let mut values = Vec::with_capacity(ops.len());
        for op in ops {
            values.push(op.await);
        }
        deliver_to.deliver(values);
    });
    joined
}

/// Expose a background task as a channel it produces values into
///
/// Creates a channel of the given kind, launches `body` as a task with that channel, and returns
/// the channel right away. Typically the body loops forever, putting values into the channel.
pub fn as_chan<T, F, Fut>(scheduler: &Scheduler, kind: ChannelKind, body: F) -> Channel<T>
where
    T: 'static,
    F: FnOnce(Channel<T>) -> Fut,
    Fut: Future + 'static,
    Fut::Output: 'static,
{
    let output = Channel::new(scheduler, kind);
    scheduler.spawn(body(output.clone()));
    output
}
