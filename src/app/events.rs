//! Outbound bus events.
//!
//! The [`S88BusManager`](crate::s88::manager::S88BusManager) emits these
//! through the [`BusEventSink`](super::ports::BusEventSink) port.  Each one
//! renders to the DCC++ line the command station broadcasts to every
//! connected client.

use core::fmt::{self, Write};

/// Longest rendered line: `<S88 255 255 65535>`.
pub const MAX_LINE_LEN: usize = 32;

/// A rendered protocol line.
pub type Line = heapless::String<MAX_LINE_LEN>;

/// Structured events emitted by the bus manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// A bus was created, updated, or listed.
    BusShown { id: u8, pin: u8, count: u16 },

    /// Sensor became (or is listed as) active.
    SensorActive(u32),

    /// Sensor became (or is listed as) inactive.
    SensorInactive(u32),
}

impl BusEvent {
    /// Event describing `sensor`'s current state.
    pub fn sensor_state(id: u32, active: bool) -> Self {
        if active {
            Self::SensorActive(id)
        } else {
            Self::SensorInactive(id)
        }
    }

    /// Render as a protocol line.
    pub fn to_line(&self) -> Line {
        let mut line = Line::new();
        // Every variant fits in MAX_LINE_LEN.
        let _ = write!(line, "{self}");
        line
    }
}

impl fmt::Display for BusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusShown { id, pin, count } => write!(f, "<S88 {} {} {}>", id, pin, count),
            Self::SensorActive(id) => write!(f, "<Q {}>", id),
            Self::SensorInactive(id) => write!(f, "<q {}>", id),
        }
    }
}

/// Direct reply to an S88 command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Failed,
}

impl Reply {
    pub fn from_success(ok: bool) -> Self {
        if ok { Self::Ok } else { Self::Failed }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "<O>",
            Self::Failed => "<X>",
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
