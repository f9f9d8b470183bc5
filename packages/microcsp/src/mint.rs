// minting of identities for promises and sources.

use std::{
    fmt::{self, Debug, Formatter},
    sync::atomic::{
        AtomicU64,
        Ordering::Relaxed,
    },
};


// shared counter. identities only need to be distinct, so a single relaxed counter for the whole
// process is enough, and it lets promises be created without a scheduler at hand.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn mint() -> u64 {
    NEXT_ID.fetch_add(1, Relaxed)
}


/// Identity of a [`Promise`](crate::Promise)
///
/// Two promises are equal if and only if they are the same promise.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PromiseId(u64);

impl PromiseId {
    pub(crate) fn mint() -> Self {
        PromiseId(mint())
    }
}

impl Debug for PromiseId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "PromiseId({})", self.0)
    }
}


/// Identity of a value source: a channel or a timer
///
/// This is what [`select`](crate::select) tags merged values with, so callers can tell which source
/// produced a value by comparing against [`Channel::id`](crate::Channel::id) or
/// [`Timer::id`](crate::Timer::id).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SourceId(u64);

impl SourceId {
    pub(crate) fn mint() -> Self {
        SourceId(mint())
    }
}

impl Debug for SourceId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_are_distinct() {
        let a = SourceId::mint();
        let b = SourceId::mint();
        assert_ne!(a, b);
        assert_eq!(a, a);

        let p = PromiseId::mint();
        let q = PromiseId::mint();
        assert_ne!(p, q);
    }
}
