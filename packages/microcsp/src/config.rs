// runtime configuration.

use crate::channel::api::ChannelKind;
use std::time::Duration;


/// Default pause between scheduler ticks
///
/// Trades responsiveness against CPU and power usage. Not a correctness parameter.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Default capacity for channels created by combinators, such as the merge channel of
/// [`select`](crate::select)
pub const DEFAULT_CAPACITY: usize = 1;


/// Scheduler configuration
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    /// Pause between ticks in [`Scheduler::run`](crate::Scheduler::run) and friends
    pub tick_interval: Duration,
    /// Capacity of channels created by combinators when not specified explicitly
    pub default_capacity: usize,
    /// Kind of the output channels of [`clone_channel`](crate::clone_channel) and
    /// [`ChannelProducer`](crate::ChannelProducer) when not specified explicitly
    pub fan_out_kind: ChannelKind,
}

impl Config {
    /// Ownership-chaining setter for [`tick_interval`](Self::tick_interval)
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Ownership-chaining setter for [`default_capacity`](Self::default_capacity)
    ///
    /// Panics if `default_capacity` is 0.
    pub fn with_default_capacity(mut self, default_capacity: usize) -> Self {
        assert!(default_capacity > 0, "channel capacity must be at least 1");
        self.default_capacity = default_capacity;
        self
    }

    /// Ownership-chaining setter for [`fan_out_kind`](Self::fan_out_kind)
    ///
    /// Panics if the kind's limit is 0.
    pub fn with_fan_out_kind(mut self, fan_out_kind: ChannelKind) -> Self {
        assert!(fan_out_kind.limit() > 0, "channel capacity must be at least 1");
        self.fan_out_kind = fan_out_kind;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tick_interval: TICK_INTERVAL,
            default_capacity: DEFAULT_CAPACITY,
            fan_out_kind: ChannelKind::DropOldest(DEFAULT_CAPACITY),
        }
    }
}
