// fan-out: duplicating one channel's values into several independent channels.

use crate::{
    channel::api::{Channel, ChannelKind},
    scheduler::Scheduler,
};
use smallvec::SmallVec;


/// Duplicate every value of `source` into `n` new channels
///
/// One auxiliary task loops: await a value from `source`, then put it into every output, one after
/// the other, in a fixed order. The outputs have [`Config::fan_out_kind`](crate::Config::fan_out_kind),
/// drop-oldest by default, so a slow consumer loses intermediate values rather than stalling the
/// others. With bounded outputs, one full output stalls the whole broadcast.
///
/// When `source` closes, every output is closed and the task ends.
pub fn clone_channel<T>(scheduler: &Scheduler, source: &Channel<T>, n: usize) -> Vec<Channel<T>>
where
    T: Clone + 'static,
{
    clone_channel_with(scheduler, source, n, scheduler.config().fan_out_kind)
}

/// [`clone_channel`] with an explicitly chosen output channel kind
pub fn clone_channel_with<T>(
    scheduler: &Scheduler,
    source: &Channel<T>,
    n: usize,
    kind: ChannelKind,
) -> Vec<Channel<T>>
where
    T: Clone + 'static,
{
    let outputs = (0..n)
        .map(|_| Channel::new(scheduler, kind))
        .collect::<SmallVec<[Channel<T>; 4]>>();
    forward(scheduler, source.clone(), outputs.clone());
    outputs.into_vec()
}

// spawn the task copying values from source into every sink.
fn forward<T>(scheduler: &Scheduler, source: Channel<T>, sinks: SmallVec<[Channel<T>; 4]>)
where
    T: Clone + 'static,
{
    scheduler.spawn(async move {
        while let Some(value) = source.get().await {
            for sink in &sinks {
                // a sink closed by its consumer just stops receiving
                sink.put(value.clone()).await;
            }
        }
        for sink in &sinks {
            sink.close();
        }
        trace!(source = ?source.id(), "clone source closed, closed its outputs");
    });
}


/// Hands out any number of independent copies of a channel, over time
///
/// Unlike [`clone_channel`], the number of consumers need not be known up front. The producer keeps
/// one reserved tap of the source. Each [`get_clone`](Self::get_clone) clones the reserved tap into
/// two fresh channels, keeps one as the new reserved tap, and hands out the other.
///
/// This builds a chain with one live forwarding task per clone ever handed out. The chain never
/// shrinks, even if consumers abandon their clones, so the cost grows with the total number of
/// registrations.
pub struct ChannelProducer<T> {
    scheduler: Scheduler,
    reserved: Channel<T>,
    kind: ChannelKind,
    handed_out: usize,
}

impl<T: Clone + 'static> ChannelProducer<T> {
    /// Create a producer of copies of `source`, using [`Config::fan_out_kind`](crate::Config::fan_out_kind)
    pub fn new(scheduler: &Scheduler, source: Channel<T>) -> Self {
        ChannelProducer::with_kind(scheduler, source, scheduler.config().fan_out_kind)
    }

    /// Create a producer of copies of `source` of the given kind
    pub fn with_kind(scheduler: &Scheduler, source: Channel<T>, kind: ChannelKind) -> Self {
        ChannelProducer {
            scheduler: scheduler.clone(),
            reserved: source,
            kind,
            handed_out: 0,
        }
    }

    /// Register a new consumer, returning its own copy of the source
    pub fn get_clone(&mut self) -> Channel<T> {
        let reserved = Channel::new(&self.scheduler, self.kind);
        let handed = Channel::new(&self.scheduler, self.kind);
        let mut sinks = SmallVec::new();
        sinks.push(reserved.clone());
        sinks.push(handed.clone());
        forward(&self.scheduler, self.reserved.clone(), sinks);
        self.reserved = reserved;
        self.handed_out += 1;
        trace!(chain = self.handed_out, "extended channel producer chain");
        handed
    }

    /// Number of clones handed out so far, which is also the length of the forwarding chain
    pub fn handed_out(&self) -> usize {
        self.handed_out
    }
}
