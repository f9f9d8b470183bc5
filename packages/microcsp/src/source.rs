// things that produce a stream of values which combinators can forward.

use crate::{
    channel::api::Channel,
    mint::SourceId,
    timer::Timer,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;


/// Something a task can repeatedly request values from
///
/// This is what [`select`](crate::select) is generic over. Channels yield `Option<T>`, with `None`
/// meaning the channel is closed, and timers yield `()` once per period.
pub trait Source: 'static {
    /// Type of the values produced
    type Item: 'static;

    /// Identity that values forwarded from this source are tagged with
    fn source_id(&self) -> SourceId;

    /// Request the next value
    fn next(&self) -> LocalBoxFuture<'static, Self::Item>;

    /// Whether this source will never produce anything meaningful again
    ///
    /// Forwarding tasks stop after forwarding the first value they receive while this returns true.
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Type-erased [`Source`], for selecting over sources of different types
pub type BoxSource<T> = Box<dyn Source<Item = T>>;

impl<T: 'static> Source for Channel<T> {
    type Item = Option<T>;

    fn source_id(&self) -> SourceId {
        self.id()
    }

    fn next(&self) -> LocalBoxFuture<'static, Option<T>> {
        Box::pin(self.get())
    }

    fn is_exhausted(&self) -> bool {
        self.is_closed()
    }
}

impl Source for Timer {
    type Item = ();

    fn source_id(&self) -> SourceId {
        self.id()
    }

    fn next(&self) -> LocalBoxFuture<'static, ()> {
        Box::pin(self.get())
    }
}

impl<T: 'static> Source for BoxSource<T> {
    type Item = T;

    fn source_id(&self) -> SourceId {
        (**self).source_id()
    }

    fn next(&self) -> LocalBoxFuture<'static, T> {
        (**self).next()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}


/// Source adapter which transforms every value, created by [`SourceExt::map`]
///
/// Keeps the identity of the underlying source.
pub struct Map<S, F> {
    source: S,
    f: Rc<F>,
}

impl<S, F, U> Source for Map<S, F>
where
    S: Source,
    F: Fn(S::Item) -> U + 'static,
    U: 'static,
{
    type Item = U;

    fn source_id(&self) -> SourceId {
        self.source.source_id()
    }

    fn next(&self) -> LocalBoxFuture<'static, U> {
        let next = self.source.next();
        let f = Rc::clone(&self.f);
        Box::pin(async move { f(next.await) })
    }

    fn is_exhausted(&self) -> bool {
        self.source.is_exhausted()
    }
}


/// Extension methods for [`Source`]
pub trait SourceExt: Source + Sized {
    /// Transform every value this source produces
    fn map<F, U>(self, f: F) -> Map<Self, F>
    where
        F: Fn(Self::Item) -> U + 'static,
        U: 'static,
    {
        Map { source: self, f: Rc::new(f) }
    }

    /// Erase this source's type
    fn boxed(self) -> BoxSource<Self::Item> {
        Box::new(self)
    }
}

impl<S: Source> SourceExt for S {}
