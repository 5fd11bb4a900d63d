//! Fuzz target: `S88` command arguments
//!
//! Splits arbitrary text into arguments and runs it against a live
//! manager.  Every call must return a reply (or none for a listing) and
//! never panic.
//!
//! cargo fuzz run fuzz_command_args

#![no_main]

use libfuzzer_sys::fuzz_target;
use s88bus::adapters::gpio::SimGpio;
use s88bus::app::events::BusEvent;
use s88bus::app::ports::{BusEventSink, RestrictedPins};
use s88bus::config::S88Config;
use s88bus::s88::S88BusManager;

struct Discard;

impl BusEventSink for Discard {
    fn emit(&mut self, _event: &BusEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let config = S88Config::default();
    let guard = RestrictedPins::for_board(&config);
    let manager = S88BusManager::new(config, SimGpio::new(), Discard, guard);
    for line in text.lines().take(16) {
        let args: Vec<&str> = line.split_whitespace().collect();
        let reply = manager.handle_args(&args);
        assert_eq!(reply.is_none(), args.is_empty());
    }
});
