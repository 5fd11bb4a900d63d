//! S88 sensor bus firmware library.
//!
//! Exposes the bus manager, its ports, and the host-side adapters for
//! integration testing.  ESP-IDF-specific code is behind the `espidf`
//! feature within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod s88;

pub use error::{BusError, Error, Result};
