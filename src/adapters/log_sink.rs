//! Log-based event sink adapter.
//!
//! Writes every [`BusEvent`] to the serial console.  Paired with the
//! broadcast sink on the device so sensor traffic is visible on UART.

use log::info;

use crate::app::events::BusEvent;
use crate::app::ports::BusEventSink;

/// Adapter that logs every [`BusEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl BusEventSink for LogEventSink {
    fn emit(&mut self, event: &BusEvent) {
        match event {
            BusEvent::BusShown { id, pin, count } => {
                info!("S88 | bus={} pin={} sensors={}", id, pin, count);
            }
            BusEvent::SensorActive(id) => info!("S88 | sensor {} ACTIVE", id),
            BusEvent::SensorInactive(id) => info!("S88 | sensor {} INACTIVE", id),
        }
    }
}
