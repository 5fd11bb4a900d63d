//! Fuzz target: stored bus list → registry
//!
//! Arbitrary bytes in the `s88.json` blob must never panic the parser or
//! the loader, and whatever loads must keep pins and sensor IDs unique.
//!
//! cargo fuzz run fuzz_persisted_buses

#![no_main]

use std::collections::HashSet;

use libfuzzer_sys::fuzz_target;
use s88bus::config::S88Config;
use s88bus::s88::BusRegistry;
use s88bus::s88::persist::PersistedBuses;

fuzz_target!(|data: &[u8]| {
    let Ok(persisted) = PersistedBuses::from_json(data) else {
        return;
    };
    let mut registry = BusRegistry::new(&S88Config::default());
    let loaded = registry.load(&persisted);
    assert_eq!(loaded, registry.len());

    let pins: HashSet<u8> = registry.buses().map(|b| b.data_pin()).collect();
    assert_eq!(pins.len(), registry.len(), "duplicate data pin loaded");

    let sensors: usize = registry.buses().map(|b| b.sensors().len()).sum();
    assert_eq!(sensors, registry.index().len(), "overlapping sensor IDs loaded");
});
