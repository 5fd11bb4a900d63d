//! S88 sensor bus domain: sensors, buses, the registry, persistence, the
//! scan protocol, and the manager that ties them to the ports.

pub mod bus;
pub mod manager;
pub mod persist;
pub mod registry;
pub mod scan;
pub mod sensor;

pub use manager::S88BusManager;
pub use registry::{BusRegistry, Upserted};
pub use scan::{CycleReport, ScanEngine};
