//! Scan protocol against a recording pin backend.

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use s88bus::app::ports::RestrictedPins;
use s88bus::config::{S88Config, ScanTiming};
use s88bus::s88::{BusRegistry, ScanEngine};

use crate::mock_hw::{Lines, NoDelay, PinCall, RecordingGpio};

fn setup(buses: &[(u8, u8, u16)]) -> (S88Config, BusRegistry) {
    let config = S88Config::default();
    let mut registry = BusRegistry::new(&config);
    for &(id, pin, count) in buses {
        registry
            .create_or_update(id, pin, count, &RestrictedPins::none())
            .unwrap();
    }
    (config, registry)
}

#[test]
fn shorter_bus_stops_reading_but_sees_every_clock() {
    let (config, mut registry) = setup(&[(0, 4, 12), (1, 13, 3)]);
    let mut engine = ScanEngine::new(&config, NoDelay);
    let mut gpio = RecordingGpio::new();

    let report = engine.run_cycle(&mut registry, &mut gpio, &mut Lines::default());

    assert_eq!(report.shift_pulses, 12);
    assert_eq!(gpio.reads_of(4), 12);
    assert_eq!(gpio.reads_of(13), 3);
    // One latch pulse plus one per shift.
    assert_eq!(gpio.rises_of(config.clock_pin), 13);
    assert_eq!(registry.bus(1).unwrap().cursor(), 3);
}

#[test]
fn reads_happen_after_load_falls() {
    let (config, mut registry) = setup(&[(0, 4, 2)]);
    let mut engine = ScanEngine::new(&config, NoDelay);
    let mut gpio = RecordingGpio::new();
    engine.run_cycle(&mut registry, &mut gpio, &mut Lines::default());

    let load_low = gpio
        .calls
        .iter()
        .position(|&c| c == PinCall::Set(config.load_pin, false))
        .unwrap();
    let first_read = gpio.calls.iter().position(|&c| c == PinCall::Read(4)).unwrap();
    assert!(first_read > load_low);

    // Reset pulse sits between the latch clock and LOAD falling.
    let reset_high = gpio
        .calls
        .iter()
        .position(|&c| c == PinCall::Set(config.reset_pin, true))
        .unwrap();
    assert!(reset_high < load_low);
}

#[test]
fn transitions_are_broadcast_once_per_change() {
    let (config, mut registry) = setup(&[(1, 4, 4)]);
    let mut engine = ScanEngine::new(&config, NoDelay);
    let mut gpio = RecordingGpio { low: vec![4], ..RecordingGpio::new() };
    let mut lines = Lines::default();

    engine.run_cycle(&mut registry, &mut gpio, &mut lines);
    engine.run_cycle(&mut registry, &mut gpio, &mut lines);
    gpio.low.clear();
    engine.run_cycle(&mut registry, &mut gpio, &mut lines);

    assert_eq!(
        lines.0,
        vec![
            "<Q 1024>", "<Q 1025>", "<Q 1026>", "<Q 1027>",
            "<q 1024>", "<q 1025>", "<q 1026>", "<q 1027>",
        ]
    );
}

#[test]
fn empty_registry_still_runs_preamble() {
    let (config, mut registry) = setup(&[]);
    let mut engine = ScanEngine::new(&config, NoDelay);
    let mut gpio = RecordingGpio::new();
    let report = engine.run_cycle(&mut registry, &mut gpio, &mut Lines::default());
    assert_eq!(report.shift_pulses, 0);
    assert_eq!(gpio.rises_of(config.clock_pin), 1);
    assert_eq!(gpio.rises_of(config.load_pin), 1);
}

#[test]
fn custom_timing_is_applied() {
    struct Total(Rc<Cell<u64>>);
    impl DelayNs for Total {
        fn delay_ns(&mut self, ns: u32) {
            self.0.set(self.0.get() + u64::from(ns));
        }
    }

    let config = S88Config {
        timing: ScanTiming {
            load_pre_clock_us: 1,
            clock_pulse_us: 2,
            clock_pre_reset_us: 3,
            reset_pulse_us: 4,
            load_post_reset_us: 5,
            read_settle_us: 6,
        },
        ..S88Config::default()
    };
    let mut registry = BusRegistry::new(&config);
    registry.create_or_update(0, 4, 1, &RestrictedPins::none()).unwrap();
    let total = Rc::new(Cell::new(0));
    let mut engine = ScanEngine::new(&config, Total(Rc::clone(&total)));
    engine.run_cycle(&mut registry, &mut RecordingGpio::new(), &mut Lines::default());

    // Preamble 1+2+3+4+5+6 µs, one shift: clock 2 + settle 6.
    assert_eq!(total.get(), 29_000);
}
