//! S88 scan configuration parameters
//!
//! Control-line pins, scan cadence, and the per-phase protocol delays.
//! Values can be overridden via NVS; every field is range-checked by
//! [`S88Config::validate`] before it is persisted.

use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::pins;

/// Logic level a module drives onto the data line for an occupied input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveLevel {
    Low,
    High,
}

impl ActiveLevel {
    /// Whether a sampled data-line level means "active".
    pub fn is_active(self, level_high: bool) -> bool {
        match self {
            Self::Low => !level_high,
            Self::High => level_high,
        }
    }
}

/// Delays of one scan cycle, all in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTiming {
    /// LOAD high before the first CLOCK pulse (parallel-load setup).
    pub load_pre_clock_us: u32,
    /// Width of every CLOCK pulse.
    pub clock_pulse_us: u32,
    /// Gap between the load CLOCK pulse and RESET.
    pub clock_pre_reset_us: u32,
    /// Width of the RESET pulse.
    pub reset_pulse_us: u32,
    /// LOAD stays high this long after RESET falls.
    pub load_post_reset_us: u32,
    /// Settle time before every data-line sample.
    pub read_settle_us: u32,
}

impl Default for ScanTiming {
    fn default() -> Self {
        Self {
            load_pre_clock_us: 50,
            clock_pulse_us: 50,
            clock_pre_reset_us: 50,
            reset_pulse_us: 50,
            load_post_reset_us: 50,
            read_settle_us: 50,
        }
    }
}

impl ScanTiming {
    fn fields(&self) -> [u32; 6] {
        [
            self.load_pre_clock_us,
            self.clock_pulse_us,
            self.clock_pre_reset_us,
            self.reset_pulse_us,
            self.load_post_reset_us,
            self.read_settle_us,
        ]
    }
}

/// Core S88 configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S88Config {
    // --- Shared control lines ---
    pub clock_pin: u8,
    pub reset_pin: u8,
    pub load_pin: u8,

    // --- Scanning ---
    /// Pause between scan cycles (milliseconds)
    pub scan_interval_ms: u32,
    pub timing: ScanTiming,
    /// Data-line level that marks a sensor active
    pub active_level: ActiveLevel,

    // --- Sensor ID layout ---
    /// Size of each bus's sensor-ID window
    pub max_sensors_per_bus: u16,
    /// Sensor ID of bus 0, shift position 0
    pub first_sensor_id: u32,
}

impl Default for S88Config {
    fn default() -> Self {
        Self {
            clock_pin: pins::S88_CLOCK_GPIO,
            reset_pin: pins::S88_RESET_GPIO,
            load_pin: pins::S88_LOAD_GPIO,

            scan_interval_ms: 50, // 20 Hz
            timing: ScanTiming::default(),
            active_level: ActiveLevel::Low,

            max_sensors_per_bus: 512,
            first_sensor_id: 512,
        }
    }
}

impl S88Config {
    /// Load the stored configuration and range-check it.
    pub fn from_port(port: &impl ConfigPort) -> crate::Result<Self> {
        let config = port.load()?;
        config.validate()?;
        Ok(config)
    }

    /// First sensor ID owned by bus `bus_id`.
    pub fn sensor_base(&self, bus_id: u8) -> u32 {
        u32::from(bus_id) * u32::from(self.max_sensors_per_bus) + self.first_sensor_id
    }

    /// The three shared control pins.
    pub fn control_pins(&self) -> [u8; 3] {
        [self.clock_pin, self.reset_pin, self.load_pin]
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [clock, reset, load] = self.control_pins();
        if clock == reset || clock == load || reset == load {
            return Err(ConfigError::ValidationFailed(
                "clock, reset and load pins must be distinct",
            ));
        }
        if self.control_pins().iter().any(|&p| p > pins::MAX_GPIO) {
            return Err(ConfigError::ValidationFailed("control pin out of range"));
        }
        if !(10..=10_000).contains(&self.scan_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "scan_interval_ms must be 10–10000",
            ));
        }
        if self.timing.fields().iter().any(|&us| us == 0 || us > 10_000) {
            return Err(ConfigError::ValidationFailed(
                "scan delays must be 1–10000 µs",
            ));
        }
        if self.max_sensors_per_bus == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_sensors_per_bus must be non-zero",
            ));
        }
        // The window of bus 255 must end inside the u32 ID range.
        let last_id = (u64::from(u8::MAX) + 1) * u64::from(self.max_sensors_per_bus)
            + u64::from(self.first_sensor_id);
        if last_id > u64::from(u32::MAX) {
            return Err(ConfigError::ValidationFailed(
                "sensor ID layout exceeds the u32 range",
            ));
        }
        Ok(())
    }
}
