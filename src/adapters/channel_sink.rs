//! Broadcast adapter: renders [`BusEvent`]s to protocol lines and queues
//! them for the transport task.
//!
//! ```text
//! ┌──────────────┐   Line   ┌──────────────────┐
//! │  scan task / │────────▶│  transport task  │──▶ every client
//! │  commands    │          │  (drains queue)  │
//! └──────────────┘          └──────────────────┘
//! ```
//!
//! The bus lock is held while events are emitted, so the sink never
//! blocks: a full queue drops the line with a warning.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{trace, warn};

use crate::app::events::{BusEvent, Line};
use crate::app::ports::BusEventSink;

/// Depth of the outbound broadcast queue.
pub const BROADCAST_DEPTH: usize = 32;

pub type BroadcastChannel = Channel<CriticalSectionRawMutex, Line, BROADCAST_DEPTH>;

/// Outbound broadcast queue: bus manager → transport task.
pub static BROADCAST_CHANNEL: BroadcastChannel = Channel::new();

/// [`BusEventSink`] feeding a broadcast channel.
pub struct ChannelSink {
    channel: &'static BroadcastChannel,
    dropped: u32,
}

impl ChannelSink {
    pub fn new(channel: &'static BroadcastChannel) -> Self {
        Self { channel, dropped: 0 }
    }

    /// Sink feeding [`BROADCAST_CHANNEL`].
    pub fn global() -> Self {
        Self::new(&BROADCAST_CHANNEL)
    }

    /// Lines lost to a full queue since start-up.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl BusEventSink for ChannelSink {
    fn emit(&mut self, event: &BusEvent) {
        let line = event.to_line();
        trace!("broadcast: {}", line);
        if self.channel.try_send(line).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            warn!("broadcast: queue full, dropped {} ({} total)", event, self.dropped);
        }
    }
}

/// Pop every queued line into `f`.  Returns the number delivered.
pub fn drain(channel: &BroadcastChannel, mut f: impl FnMut(&str)) -> usize {
    let mut n = 0;
    while let Ok(line) = channel.try_receive() {
        f(&line);
        n += 1;
    }
    n
}
