//! Port traits — the hexagonal boundary between the bus manager and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ S88BusManager (domain)
//! ```
//!
//! Driven adapters (GPIO, storage, broadcast) implement these traits.  The
//! [`S88BusManager`](crate::s88::manager::S88BusManager) consumes them via
//! generics, so the scan protocol can run against a simulated pin backend.

use heapless::Vec;

use super::events::BusEvent;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain ↔ pins)
// ───────────────────────────────────────────────────────────────

/// Pin-level access used by the scan protocol and bus lifecycle.
///
/// Pins are addressed by number because bus data pins are chosen at
/// runtime.  GPIO operations are assumed infallible.
pub trait GpioPort {
    /// Configure `pin` as a push-pull output.
    fn configure_output(&mut self, pin: u8);

    /// Configure `pin` as a floating input.
    fn configure_input(&mut self, pin: u8);

    /// Drive `pin` high (`true`) or low.
    fn set_level(&mut self, pin: u8, high: bool);

    /// Sample `pin`; `true` = high.
    fn read_level(&mut self, pin: u8) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Restricted-pin predicate (provided by the board owner)
// ───────────────────────────────────────────────────────────────

/// Decides whether a pin is reserved by another subsystem.
pub trait PinGuard {
    fn is_restricted(&self, pin: u8) -> bool;
}

/// Maximum number of pins a [`RestrictedPins`] list can hold.
pub const MAX_RESTRICTED_PINS: usize = 32;

/// List-backed [`PinGuard`].
#[derive(Debug, Clone, Default)]
pub struct RestrictedPins {
    pins: Vec<u8, MAX_RESTRICTED_PINS>,
}

impl RestrictedPins {
    /// A guard that restricts nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from a pin list; duplicates are collapsed and pins beyond
    /// [`MAX_RESTRICTED_PINS`] are dropped.
    pub fn from_pins(pins: &[u8]) -> Self {
        let mut guard = Self::default();
        for &pin in pins {
            guard.add(pin);
        }
        guard
    }

    /// Board defaults plus the S88 control lines of `config`.
    pub fn for_board(config: &crate::config::S88Config) -> Self {
        let mut guard = Self::from_pins(&crate::pins::ESP32_RESERVED_GPIOS);
        for pin in crate::pins::SUBSYSTEM_GPIOS
            .into_iter()
            .chain(config.control_pins())
        {
            guard.add(pin);
        }
        guard
    }

    /// Add one pin.  Returns `false` if the list is full.
    pub fn add(&mut self, pin: u8) -> bool {
        if self.pins.contains(&pin) {
            return true;
        }
        self.pins.push(pin).is_ok()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

impl PinGuard for RestrictedPins {
    fn is_restricted(&self, pin: u8) -> bool {
        self.pins.contains(&pin)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → broadcast transport)
// ───────────────────────────────────────────────────────────────

/// The manager emits [`BusEvent`]s through this port.  Adapters decide
/// where they go (connected protocol clients, serial log).
pub trait BusEventSink {
    fn emit(&mut self, event: &BusEvent);
}

/// Fan out to two sinks, in order.
impl<A: BusEventSink, B: BusEventSink> BusEventSink for (A, B) {
    fn emit(&mut self, event: &BusEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the scan configuration.
///
/// Implementations MUST validate before persisting.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`S88Config::default()`](crate::config::S88Config) if none is stored.
    fn load(&self) -> Result<crate::config::S88Config, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &crate::config::S88Config) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value blob storage.
///
/// Write operations MUST be atomic — no partial writes on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Value does not fit the caller's buffer or the backend's blob limit.
    TooLarge,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::TooLarge => write!(f, "value too large"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ConfigError {}
impl core::error::Error for StorageError {}
