// implementation of microcsp channels.
//
// the architecture is as such:
//
// channel handles wrap around Rc<RefCell<core state>>
//                                        |
//          /-----------------------------/
//          v
//       core state
//          |
//          |------ it contains a VecDeque<T> holding the buffered elements, never longer than the
//          |       channel's limit.
//          |
//          |------ it contains a "send node queue": a FIFO of pending puts, each a producer-side
//          |       promise handle paired with the element it carries. the caller holds the
//          |       consumer side of the promise.
//          |
//          \------ it contains a "recv node queue", which is the same idea for pending gets.
//
// the scheduler holds another Rc to the same core state, as a `dyn Process`. nothing is resolved
// when an operation is requested. instead, once per tick, the scheduler runs the core's process
// step, which first drains the send node queue into the buffer as far as the admission policy
// allows, then drains the buffer into the recv node queue. both drains stop at the first node that
// can't be served, which is what makes service first-come first-served.
//
// there is no locking anywhere. all mutation happens inside the single thread that runs ticks and
// task bodies, and the RefCell borrows never outlive a single method call.
//
// the organization of these modules is as such:
//
//      core: the state above and the process step. knows nothing about scheduling beyond
//            implementing `Process`.
//
//      api:  the `Channel` handle and `ChannelKind`, which the crate re-exports publicly.

pub(crate) mod api;

mod core;
