//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                 |
//! |----------------|--------------------|-----------------------------|
//! | `gpio`         | GpioPort           | ESP32 GPIO / in-memory pads |
//! | `nvs`          | ConfigPort         | NVS / in-memory store       |
//! |                | StoragePort        |                             |
//! | `channel_sink` | BusEventSink       | Broadcast queue → clients   |
//! | `log_sink`     | BusEventSink       | Serial log output           |

pub mod channel_sink;
pub mod gpio;
pub mod log_sink;
pub mod nvs;
