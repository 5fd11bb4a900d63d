//! Application boundary — commands in, events out, ports to the hardware.
//!
//! All interaction with pins, storage, and the broadcast transport happens
//! through the **port traits** defined in [`ports`], keeping the bus
//! manager testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
