//! GPIO adapters for [`GpioPort`].
//!
//! `EspGpio` drives the ESP32 pads directly through the IDF GPIO driver,
//! addressing pins by number because bus data pins are chosen at runtime.
//! `SimGpio` is an in-memory pad model used off-target.

use std::collections::BTreeMap;

use crate::app::ports::GpioPort;

#[cfg(feature = "espidf")]
pub use esp::EspGpio;

#[cfg(feature = "espidf")]
mod esp {
    use esp_idf_svc::sys::*;
    use log::warn;

    use crate::app::ports::GpioPort;

    /// Raw IDF GPIO driver access.
    pub struct EspGpio;

    impl EspGpio {
        pub fn new() -> Self {
            Self
        }

        fn configure(pin: u8, mode: gpio_mode_t) {
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pin,
                mode,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            };
            // SAFETY: gpio_config only touches the pad named in the bit mask.
            let ret = unsafe { gpio_config(&cfg) };
            if ret != ESP_OK as i32 {
                warn!("gpio: configuring pin {} failed ({})", pin, ret);
            }
        }
    }

    impl Default for EspGpio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl GpioPort for EspGpio {
        fn configure_output(&mut self, pin: u8) {
            Self::configure(pin, gpio_mode_t_GPIO_MODE_OUTPUT);
        }

        fn configure_input(&mut self, pin: u8) {
            Self::configure(pin, gpio_mode_t_GPIO_MODE_INPUT);
        }

        fn set_level(&mut self, pin: u8, high: bool) {
            // SAFETY: register write on a pin configured as output.
            unsafe {
                gpio_set_level(i32::from(pin), u32::from(high));
            }
        }

        fn read_level(&mut self, pin: u8) -> bool {
            // SAFETY: read-only register access.
            (unsafe { gpio_get_level(i32::from(pin)) }) != 0
        }
    }
}

/// Direction a simulated pad was configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Output,
    Input,
}

/// In-memory pad model.  Inputs read high (idle) until driven with
/// [`SimGpio::set_input`].
#[derive(Debug, Default)]
pub struct SimGpio {
    modes: BTreeMap<u8, PinMode>,
    levels: BTreeMap<u8, bool>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive the level a simulated input pin will read.
    pub fn set_input(&mut self, pin: u8, high: bool) {
        self.levels.insert(pin, high);
    }

    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.modes.get(&pin).copied()
    }

    /// Last level written to or driven onto `pin`.
    pub fn level(&self, pin: u8) -> Option<bool> {
        self.levels.get(&pin).copied()
    }
}

impl GpioPort for SimGpio {
    fn configure_output(&mut self, pin: u8) {
        self.modes.insert(pin, PinMode::Output);
    }

    fn configure_input(&mut self, pin: u8) {
        self.modes.insert(pin, PinMode::Input);
    }

    fn set_level(&mut self, pin: u8, high: bool) {
        self.levels.insert(pin, high);
    }

    fn read_level(&mut self, pin: u8) -> bool {
        self.levels.get(&pin).copied().unwrap_or(true)
    }
}
