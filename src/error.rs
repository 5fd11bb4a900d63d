//! Unified error types for the S88 sensor bus subsystem.
//!
//! Every registry rejection is a `BusError`; the command surface collapses
//! all of them into the protocol failure token, while the variant itself
//! only ever reaches the log.  All variants are `Copy` so they can be
//! returned from inside the bus lock without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the subsystem funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bus create/update/remove request was rejected.
    Bus(BusError),
    /// The key-value store failed.
    Storage(StorageError),
    /// Scan configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// The persisted bus blob could not be parsed or produced.
    Persist(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Persist(msg) => write!(f, "persist: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The data pin is already assigned to another bus.
    PinConflict { pin: u8, owner: u8 },
    /// The data pin is reserved by another subsystem.
    RestrictedPin(u8),
    /// No bus with this ID is registered.
    UnknownBus(u8),
    /// More sensors than fit in one bus's ID window.
    TooManySensors { requested: u16, max: u16 },
    /// The sensor ID belongs to a bus and can only change through it.
    BusOwnedSensor(u32),
    /// A sensor ID the bus would take is already indexed to another bus.
    SensorIdOverlap { sensor: u32, owner: u8 },
    /// The bus's sensor IDs would run past `u32::MAX`.
    SensorIdOutOfRange(u8),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinConflict { pin, owner } => {
                write!(f, "data pin {pin} already used by bus {owner}")
            }
            Self::RestrictedPin(pin) => write!(f, "pin {pin} is restricted"),
            Self::UnknownBus(id) => write!(f, "unknown bus {id}"),
            Self::TooManySensors { requested, max } => {
                write!(f, "{requested} sensors requested, at most {max} per bus")
            }
            Self::BusOwnedSensor(id) => write!(f, "sensor {id} is owned by an S88 bus"),
            Self::SensorIdOverlap { sensor, owner } => {
                write!(f, "sensor {sensor} already belongs to bus {owner}")
            }
            Self::SensorIdOutOfRange(id) => write!(f, "sensor IDs of bus {id} overflow"),
        }
    }
}

impl core::error::Error for BusError {}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Subsystem-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
