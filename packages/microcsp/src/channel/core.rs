// minimal state of a channel and its per-tick resolution step. the exposed API is a convenience
// wrapper around this.

use super::api::ChannelKind;
use crate::{
    promise::Promise,
    scheduler::{Liveness, Process},
};
use std::{
    cell::RefCell,
    collections::VecDeque,
};


// channel state. lives in an Rc<RefCell<_>> shared between the channel handles and the
// scheduler's list of processables.
pub(crate) struct Core<T> {
    // admission policy and maximum length of elems.
    kind: ChannelKind,
    // storage for elements.
    elems: VecDeque<T>,
    // queue of pending gets, front is the oldest.
    recv_nodes: VecDeque<Promise<Option<T>>>,
    // queue of pending puts with the elements they carry, front is the oldest.
    send_nodes: VecDeque<(Promise<bool>, T)>,
    // begins false. once true, never becomes false again, and elems stays empty.
    closed: bool,
}

impl<T> Core<T> {
    // construct empty, open channel.
    //
    // panics if the kind's limit is 0.
    pub(crate) fn new(kind: ChannelKind) -> Self {
        assert!(kind.limit() > 0, "channel capacity must be at least 1");
        Core {
            kind,
            elems: VecDeque::with_capacity(kind.limit()),
            recv_nodes: VecDeque::new(),
            send_nodes: VecDeque::new(),
            closed: false,
        }
    }

    pub(crate) fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn len(&self) -> usize {
        self.elems.len()
    }

    pub(crate) fn pending_recvs(&self) -> usize {
        self.recv_nodes.len()
    }

    pub(crate) fn pending_sends(&self) -> usize {
        self.send_nodes.len()
    }

    // enqueue a pending get and return the consumer side of its promise.
    pub(crate) fn recv(&mut self) -> Promise<Option<T>> {
        let promise = Promise::new();
        self.recv_nodes.push_back(promise.share());
        promise
    }

    // enqueue a pending put and return the consumer side of its promise.
    pub(crate) fn send(&mut self, elem: T) -> Promise<bool> {
        let promise = Promise::new();
        self.send_nodes.push_back((promise.share(), elem));
        promise
    }

    // mark the channel closed and drop buffered elements, which can no longer be received. returns
    // whether this call was the one that closed it.
    pub(crate) fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.elems.clear();
        true
    }

    // resolve whatever pending operations can be resolved now. puts are resolved before gets.
    pub(crate) fn process(&mut self) {
        self.process_sends();
        self.process_recvs();
    }

    fn process_sends(&mut self) {
        while let Some((promise, elem)) = self.send_nodes.pop_front() {
            if self.closed {
                promise.deliver(false);
                continue;
            }
            match self.admit(elem) {
                Ok(()) => {
                    promise.deliver(true);
                }
                Err(elem) => {
                    // blocked at the front of the queue. puts behind it must not overtake it.
                    self.send_nodes.push_front((promise, elem));
                    break;
                }
            }
        }
    }

    fn process_recvs(&mut self) {
        while let Some(promise) = self.recv_nodes.front() {
            if self.closed {
                promise.deliver(None);
            } else if let Some(elem) = self.elems.pop_front() {
                promise.deliver(Some(elem));
            } else {
                break;
            }
            self.recv_nodes.pop_front();
        }
    }

    // try to move elem into the buffer according to the admission policy, or give it back.
    fn admit(&mut self, elem: T) -> Result<(), T> {
        match self.kind {
            ChannelKind::Bounded(limit) => {
                if self.elems.len() < limit {
                    self.elems.push_back(elem);
                    Ok(())
                } else {
                    Err(elem)
                }
            }
            ChannelKind::DropOldest(limit) => {
                self.elems.push_back(elem);
                while self.elems.len() > limit {
                    self.elems.pop_front();
                    trace!(limit, "drop-oldest channel evicted its oldest element");
                }
                Ok(())
            }
        }
    }
}

impl<T> Process for RefCell<Core<T>> {
    fn process(&self) -> Liveness {
        self.borrow_mut().process();
        // channels stay live until explicitly deregistered
        Liveness::Live
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_pcg::Pcg32;

    fn new_rng() -> impl Rng {
        Pcg32::from_seed(0xdeadbeefdeadbeefdeadbeefdeadbeefu128.to_le_bytes())
    }

    #[test]
    fn bounded_blocks_at_limit() {
        let mut core = Core::new(ChannelKind::Bounded(3));
        let puts = (0..4).map(|i| core.send(i)).collect::<Vec<_>>();
        core.process();
        for put in &puts[..3] {
            assert_eq!(put.value(), Some(true));
        }
        assert!(!puts[3].is_delivered());
        assert_eq!(core.len(), 3);
        assert_eq!(core.pending_sends(), 1);

        // one get frees room, but puts are processed before gets within a step, so the blocked
        // put only lands on the step after
        let get = core.recv();
        core.process();
        assert_eq!(get.value(), Some(Some(0)));
        assert!(!puts[3].is_delivered());
        core.process();
        assert_eq!(puts[3].value(), Some(true));
    }

    #[test]
    fn blocked_put_is_not_overtaken() {
        let mut core = Core::new(ChannelKind::Bounded(1));
        let first = core.send('a');
        let second = core.send('b');
        let third = core.send('c');
        core.process();
        assert_eq!(first.value(), Some(true));
        assert!(!second.is_delivered());
        assert!(!third.is_delivered());

        let get_a = core.recv();
        let get_b = core.recv();
        let get_c = core.recv();
        for _ in 0..3 {
            core.process();
        }
        assert_eq!(get_a.value(), Some(Some('a')));
        assert_eq!(get_b.value(), Some(Some('b')));
        assert_eq!(get_c.value(), Some(Some('c')));
    }

    #[test]
    fn drop_oldest_keeps_most_recent() {
        let mut core = Core::new(ChannelKind::DropOldest(5));
        let puts = (0..10).map(|i| core.send(i)).collect::<Vec<_>>();
        core.process();
        assert!(puts.iter().all(|put| put.value() == Some(true)));
        assert_eq!(core.len(), 5);

        let gets = (0..6).map(|_| core.recv()).collect::<Vec<_>>();
        core.process();
        for (n, get) in gets[..5].iter().enumerate() {
            assert_eq!(get.value(), Some(Some(n + 5)));
        }
        assert!(!gets[5].is_delivered());
    }

    #[test]
    fn close_resolves_pending_and_future_ops() {
        for kind in [ChannelKind::Bounded(1), ChannelKind::DropOldest(1)] {
            let mut core = Core::new(kind);
            let landed = core.send(1);
            core.process();
            assert_eq!(landed.value(), Some(true));
            let blocked_put = core.send(2);
            let get_1 = core.recv();
            let get_2 = core.recv();

            assert!(core.close());
            assert!(!core.close());
            assert_eq!(core.len(), 0);

            let late_put = core.send(3);
            let late_get = core.recv();
            core.process();
            assert_eq!(blocked_put.value(), Some(false));
            assert_eq!(late_put.value(), Some(false));
            assert_eq!(get_1.value(), Some(None));
            assert_eq!(get_2.value(), Some(None));
            assert_eq!(late_get.value(), Some(None));
            assert_eq!(core.len(), 0);
        }
    }

    // compare against a VecDeque model under random interleavings of puts, gets, and steps.
    fn model_test(kind: ChannelKind) {
        let mut rng = new_rng();
        for outer in 0..20 {
            let mut core = Core::new(kind);
            let mut model = VecDeque::new();
            let mut puts = VecDeque::new();
            let mut gets = VecDeque::new();
            let mut next = 0u32;
            println!("outer loop {}", outer);
            for _ in 0..2_000 {
                match rng.gen_range(0..3) {
                    0 => {
                        puts.push_back((core.send(next), next));
                        next += 1;
                    }
                    1 => gets.push_back(core.recv()),
                    _ => {
                        core.process();

                        // resolve the model the same way: puts first, in order
                        while let Some((promise, elem)) = puts.front() {
                            if promise.is_delivered() {
                                assert_eq!(promise.value(), Some(true));
                                model.push_back(*elem);
                                if model.len() > kind.limit() {
                                    assert!(matches!(kind, ChannelKind::DropOldest(_)));
                                    model.pop_front();
                                }
                                puts.pop_front();
                            } else {
                                break;
                            }
                        }
                        while let Some(promise) = gets.front() {
                            if promise.is_delivered() {
                                assert_eq!(promise.value(), Some(model.pop_front()));
                                gets.pop_front();
                            } else {
                                break;
                            }
                        }
                        // anything still pending must be pending for a reason
                        assert!(gets.is_empty() || model.is_empty());
                        assert!(puts.is_empty() || matches!(kind, ChannelKind::Bounded(_)));
                        assert_eq!(core.len(), model.len());
                    }
                }
            }
        }
    }

    #[test]
    fn bounded_model_test() {
        model_test(ChannelKind::Bounded(1));
        model_test(ChannelKind::Bounded(4));
    }

    #[test]
    fn drop_oldest_model_test() {
        model_test(ChannelKind::DropOldest(1));
        model_test(ChannelKind::DropOldest(4));
    }
}
