// exposed API of channels

use super::core::Core;
use crate::{
    mint::SourceId,
    promise::Promise,
    scheduler::Scheduler,
};
use std::{
    cell::RefCell,
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
    rc::Rc,
};


/// Admission policy and capacity of a channel
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ChannelKind {
    /// Holds at most this many values; a put to a full channel waits until there is room
    Bounded(usize),
    /// Holds at most this many values; a put to a full channel is always admitted and evicts the
    /// oldest buffered value
    DropOldest(usize),
}

impl ChannelKind {
    /// The capacity
    pub fn limit(self) -> usize {
        match self {
            ChannelKind::Bounded(limit) | ChannelKind::DropOldest(limit) => limit,
        }
    }
}


/// Handle to a channel
///
/// Every operation returns a pending [`Promise`] which is resolved by a later
/// [`tick`](Scheduler::tick) of the scheduler the channel belongs to, never immediately. Within a
/// channel, puts are served in the order they were requested, gets are served in the order they
/// were requested, and on each tick pending puts are resolved before pending gets.
///
/// Cloning the handle does not create a new channel. Equality is identity.
pub struct Channel<T> {
    id: SourceId,
    core: Rc<RefCell<Core<T>>>,
}

impl<T: 'static> Channel<T> {
    /// Create a channel of the given kind and register it with the scheduler
    ///
    /// The channel stays registered (and is processed every tick) until
    /// [`Scheduler::deregister`] is called with its id. Closing does not deregister it.
    ///
    /// Panics if the kind's limit is 0.
    pub fn new(scheduler: &Scheduler, kind: ChannelKind) -> Self {
        let id = SourceId::mint();
        let core = Rc::new(RefCell::new(Core::new(kind)));
        scheduler.register(id, core.clone());
        Channel { id, core }
    }

    /// Create a [`ChannelKind::Bounded`] channel
    pub fn bounded(scheduler: &Scheduler, limit: usize) -> Self {
        Channel::new(scheduler, ChannelKind::Bounded(limit))
    }

    /// Create a [`ChannelKind::DropOldest`] channel
    pub fn drop_oldest(scheduler: &Scheduler, limit: usize) -> Self {
        Channel::new(scheduler, ChannelKind::DropOldest(limit))
    }
}

impl<T> Channel<T> {
    /// Request the next value from this channel
    ///
    /// Resolves to `Some` with the oldest buffered value, or to `None` if the channel is closed.
    pub fn get(&self) -> Promise<Option<T>> {
        self.core.borrow_mut().recv()
    }

    /// Request to put a value into this channel
    ///
    /// Resolves to true once the value is admitted into the buffer, or to false if the channel is
    /// closed before that happens.
    pub fn put(&self, value: T) -> Promise<bool> {
        self.core.borrow_mut().send(value)
    }

    /// Close this channel
    ///
    /// All pending and future gets resolve to `None` and all pending and future puts resolve to
    /// false. Values still buffered are dropped. Closing again has no further effect.
    pub fn close(&self) {
        if self.core.borrow_mut().close() {
            debug!(id = ?self.id, "channel closed");
        }
    }

    /// Whether this channel has been closed
    pub fn is_closed(&self) -> bool {
        self.core.borrow().is_closed()
    }

    /// This channel's identity
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// This channel's admission policy and capacity
    pub fn kind(&self) -> ChannelKind {
        self.core.borrow().kind()
    }

    /// Number of values currently buffered
    pub fn buffered(&self) -> usize {
        self.core.borrow().len()
    }

    /// Number of gets not yet resolved
    pub fn pending_gets(&self) -> usize {
        self.core.borrow().pending_recvs()
    }

    /// Number of puts not yet resolved
    pub fn pending_puts(&self) -> usize {
        self.core.borrow().pending_sends()
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Channel {
            id: self.id,
            core: Rc::clone(&self.core),
        }
    }
}

impl<T> PartialEq for Channel<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Channel<T> {}

impl<T> Hash for Channel<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Debug for Channel<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("kind", &core.kind())
            .field("buffered", &core.len())
            .field("closed", &core.is_closed())
            .finish()
    }
}


// ==== tests ====


#[cfg(test)]
mod tests {
    use super::*;

    fn settle(scheduler: &Scheduler) {
        for _ in 0..4 {
            scheduler.tick();
        }
    }

    #[test]
    fn put_into_channel() {
        let scheduler = Scheduler::new();
        let chan = Channel::bounded(&scheduler, 1);
        let put = chan.put(10);
        assert!(!put.is_delivered());
        scheduler.tick();
        assert_eq!(put.value(), Some(true));
    }

    #[test]
    fn get_from_channel() {
        let scheduler = Scheduler::new();
        let chan = Channel::bounded(&scheduler, 1);
        let get = chan.get();
        chan.put(52);
        scheduler.tick();
        assert_eq!(get.value(), Some(Some(52)));
    }

    #[test]
    fn full_bounded_put_stays_pending() {
        let scheduler = Scheduler::new();
        let bounded = Channel::bounded(&scheduler, 5);
        let sliding = Channel::drop_oldest(&scheduler, 5);
        for i in 0..5 {
            bounded.put(i);
            sliding.put(i);
        }
        scheduler.tick();

        let waiting = bounded.put(5);
        let admitted = sliding.put(5);
        settle(&scheduler);
        assert!(!waiting.is_delivered());
        assert_eq!(admitted.value(), Some(true));
        assert_eq!(bounded.buffered(), 5);
        assert_eq!(sliding.buffered(), 5);
    }

    #[test]
    fn fifo_order() {
        for kind in [ChannelKind::Bounded(5), ChannelKind::DropOldest(5)] {
            let scheduler = Scheduler::new();
            let chan = Channel::new(&scheduler, kind);
            let puts = (0..5).map(|i| chan.put(i)).collect::<Vec<_>>();
            let gets = (0..5).map(|_| chan.get()).collect::<Vec<_>>();
            scheduler.tick();
            assert!(puts.iter().all(|put| put.value() == Some(true)));
            for (n, get) in gets.iter().enumerate() {
                assert_eq!(get.value(), Some(Some(n)));
            }
        }
    }

    #[test]
    fn drop_oldest_keeps_most_recent_one() {
        let scheduler = Scheduler::new();
        let chan = Channel::drop_oldest(&scheduler, 1);
        for i in 1..=3 {
            chan.put(i);
            scheduler.tick();
        }
        let get = chan.get();
        scheduler.tick();
        assert_eq!(get.value(), Some(Some(3)));
    }

    #[test]
    fn drop_oldest_drained_one_put_per_tick() {
        let scheduler = Scheduler::new();
        let chan = Channel::drop_oldest(&scheduler, 5);
        let puts = (0..10)
            .map(|i| {
                let put = chan.put(i);
                scheduler.tick();
                put
            })
            .collect::<Vec<_>>();
        let gets = (0..10)
            .map(|_| {
                let get = chan.get();
                scheduler.tick();
                get
            })
            .collect::<Vec<_>>();
        assert!(puts.iter().all(|put| put.value() == Some(true)));
        for (n, get) in gets.iter().enumerate() {
            if n > 4 {
                assert!(!get.is_delivered());
            } else {
                assert_eq!(get.value(), Some(Some(n + 5)));
            }
        }
    }

    #[test]
    fn closed_channel_never_touches_buffer() {
        let scheduler = Scheduler::new();
        let chan = Channel::bounded(&scheduler, 2);
        let pending_get = chan.get();
        chan.close();
        chan.close();
        assert!(chan.is_closed());

        let put = chan.put(1);
        let get = chan.get();
        scheduler.tick();
        assert_eq!(pending_get.value(), Some(None));
        assert_eq!(put.value(), Some(false));
        assert_eq!(get.value(), Some(None));
        assert_eq!(chan.buffered(), 0);
        assert_eq!(chan.pending_gets(), 0);
        assert_eq!(chan.pending_puts(), 0);
    }

    #[test]
    fn handles_share_identity() {
        let scheduler = Scheduler::new();
        let a = Channel::<()>::bounded(&scheduler, 1);
        let b = Channel::<()>::bounded(&scheduler, 1);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(scheduler.live_processables(), 2);
    }

    #[test]
    #[should_panic(expected = "channel capacity must be at least 1")]
    fn zero_capacity_panics() {
        let scheduler = Scheduler::new();
        Channel::<u8>::bounded(&scheduler, 0);
    }
}
