// fan-in: merging several sources into one tagged channel.

use crate::{
    channel::api::{Channel, ChannelKind},
    mint::SourceId,
    scheduler::Scheduler,
    source::Source,
};


/// Merge several sources into one channel of values tagged with the source they came from
///
/// For every source, an auxiliary task loops: await a value from the source, then put
/// `(source id, value)` into the merge channel. Values from one source arrive in the order that
/// source produced them, and values from different sources are interleaved in the order they were
/// actually produced.
///
/// The merge channel is bounded with [`Config::default_capacity`](crate::Config::default_capacity).
/// When it is full, the forwarding tasks wait, and those registered earlier tend to be served
/// first. It is the caller's responsibility to drain the merge channel faster than the sources
/// produce, or to use [`select_with`] and a larger capacity.
///
/// A forwarding task ends once it has forwarded the first value received while its source is
/// exhausted (for a channel: the first `None` after it closed), or once the merge channel is
/// closed.
pub fn select<S, T>(scheduler: &Scheduler, sources: impl IntoIterator<Item = S>) -> Channel<(SourceId, T)>
where
    S: Source<Item = T>,
    T: 'static,
{
    let kind = ChannelKind::Bounded(scheduler.config().default_capacity);
    select_with(scheduler, kind, sources)
}

/// [`select`] with an explicitly chosen merge channel kind
pub fn select_with<S, T>(
    scheduler: &Scheduler,
    kind: ChannelKind,
    sources: impl IntoIterator<Item = S>,
) -> Channel<(SourceId, T)>
where
    S: Source<Item = T>,
    T: 'static,
{
    let merged = Channel::new(scheduler, kind);
    for source in sources {
        let merged = merged.clone();
        scheduler.spawn(async move {
            let id = source.source_id();
            loop {
                let value = source.next().await;
                // checked once the value arrived, so a source closing while awaited ends here
                let exhausted = source.is_exhausted();
                if !merged.put((id, value)).await {
                    trace!(?id, "merge channel closed, select source detached");
                    break;
                }
                if exhausted {
                    trace!(?id, "select source exhausted");
                    break;
                }
            }
        });
    }
    merged
}
