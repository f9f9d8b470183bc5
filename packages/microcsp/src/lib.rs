//! Cooperative, single-threaded CSP runtime for small control programs.
//!
//! Tasks are futures which communicate through [`Channel`]s. Every channel operation returns a
//! pending [`Promise`], and a task suspends by awaiting it. A [`Scheduler`] is the single point of
//! forward progress: on each [`tick`](Scheduler::tick) it first processes every channel and timer,
//! then resumes every task whose awaited operation was resolved.
//!
//! Channels compose through [`select`], [`clone_channel`], [`ChannelProducer`], [`do_all`] and
//! [`as_chan`]. Hardware is expected to be bridged by ordinary tasks that poll a flag and put
//! values into channels.

#[macro_use]
extern crate tracing;

mod mint;
mod promise;
mod channel;
mod scheduler;
mod task;
mod timer;
mod source;
mod select;
mod broadcast;
mod join;

pub mod config;
pub mod error;

pub use crate::{
    mint::{PromiseId, SourceId},
    promise::Promise,
    channel::api::{Channel, ChannelKind},
    scheduler::Scheduler,
    timer::Timer,
    source::{BoxSource, Map, Source, SourceExt},
    select::{select, select_with},
    broadcast::{clone_channel, clone_channel_with, ChannelProducer},
    join::{as_chan, do_all},
    config::{Config, TICK_INTERVAL},
    error::{TaskError, TaskResult},
};
