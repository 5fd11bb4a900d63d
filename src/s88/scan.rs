//! S88 scan protocol.
//!
//! One cycle parallel-loads every module, then shifts all buses in
//! lockstep on the shared CLOCK line:
//!
//! ```text
//!  LOAD   ‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾|__________________________
//!  CLOCK  ______|‾‾‾|________________________________|‾‾‾|____|‾‾‾|__ …
//!  RESET  ____________________|‾‾‾|___________________________________
//!  DATA                                        [b0]      [b1]      [b2]
//! ```
//!
//! The read loop runs until the *longest* bus is exhausted.  Shorter buses
//! stop recording once their sensors are read, but they still see every
//! clock pulse because the line is shared.

use embedded_hal::delay::DelayNs;
use log::{debug, trace};

use super::registry::BusRegistry;
use crate::app::events::BusEvent;
use crate::app::ports::{BusEventSink, GpioPort};
use crate::config::{ActiveLevel, S88Config, ScanTiming};

/// Counters for one completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Clock pulses issued by the read loop (excludes the load pulse).
    pub shift_pulses: u32,
    /// Data-line samples recorded across all buses.
    pub samples: u32,
    /// Sensors whose state changed.
    pub transitions: u32,
}

/// Drives the shared LOAD/CLOCK/RESET lines and samples every data pin.
pub struct ScanEngine<D: DelayNs> {
    clock_pin: u8,
    reset_pin: u8,
    load_pin: u8,
    timing: ScanTiming,
    polarity: ActiveLevel,
    delay: D,
    cycles: u64,
}

impl<D: DelayNs> ScanEngine<D> {
    pub fn new(config: &S88Config, delay: D) -> Self {
        Self {
            clock_pin: config.clock_pin,
            reset_pin: config.reset_pin,
            load_pin: config.load_pin,
            timing: config.timing,
            polarity: config.active_level,
            delay,
            cycles: 0,
        }
    }

    /// Configure the control lines as outputs, all low.
    pub fn init_lines(&self, gpio: &mut impl GpioPort) {
        for pin in [self.clock_pin, self.reset_pin, self.load_pin] {
            gpio.configure_output(pin);
            gpio.set_level(pin, false);
        }
        debug!(
            "S88: control lines clock={} reset={} load={}",
            self.clock_pin, self.reset_pin, self.load_pin
        );
    }

    /// Cycles completed since start-up.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one full load → clock → reset → read cycle.  The caller must
    /// hold the bus lock for the whole call.
    pub fn run_cycle(
        &mut self,
        registry: &mut BusRegistry,
        gpio: &mut impl GpioPort,
        sink: &mut impl BusEventSink,
    ) -> CycleReport {
        let t = self.timing;
        let mut report = CycleReport::default();

        // 1. Rewind every cursor.
        for bus in registry.buses_mut() {
            bus.prepare_for_read();
        }

        // 2–6. Parallel load, latch clock, reset.
        gpio.set_level(self.load_pin, true);
        self.delay.delay_us(t.load_pre_clock_us);
        self.clock_pulse(gpio);
        self.delay.delay_us(t.clock_pre_reset_us);
        gpio.set_level(self.reset_pin, true);
        self.delay.delay_us(t.reset_pulse_us);
        gpio.set_level(self.reset_pin, false);
        self.delay.delay_us(t.load_post_reset_us);
        gpio.set_level(self.load_pin, false);

        // 7. First bit settles.
        self.delay.delay_us(t.read_settle_us);

        // 8. Lockstep read loop.
        while registry.buses().any(|bus| bus.has_more()) {
            for bus in registry.buses_mut().filter(|bus| bus.has_more()) {
                let level = gpio.read_level(bus.data_pin());
                report.samples += 1;
                if let Some((id, active)) = bus.read_next(level, self.polarity) {
                    trace!("S88: sensor {} {}", id, if active { "ACTIVE" } else { "INACTIVE" });
                    sink.emit(&BusEvent::sensor_state(id, active));
                    report.transitions += 1;
                }
            }
            self.clock_pulse(gpio);
            self.delay.delay_us(t.read_settle_us);
            report.shift_pulses += 1;
        }

        self.cycles = self.cycles.wrapping_add(1);
        report
    }

    fn clock_pulse(&mut self, gpio: &mut impl GpioPort) {
        gpio.set_level(self.clock_pin, true);
        self.delay.delay_us(self.timing.clock_pulse_us);
        gpio.set_level(self.clock_pin, false);
    }
}
