//! GPIO assignments for the command station main board.
//!
//! Single source of truth for the default S88 control lines and for the
//! pins that other subsystems own.  A bus data pin may never land on one
//! of the restricted pins.

// ---------------------------------------------------------------------------
// S88 shared control lines
// ---------------------------------------------------------------------------

/// Shared CLOCK line, shifts every bus one position per pulse.
pub const S88_CLOCK_GPIO: u8 = 17;
/// Shared RESET line, clears the module input latches after a load.
pub const S88_RESET_GPIO: u8 = 16;
/// Shared LOAD (PS) line, parallel-loads every shift register.
pub const S88_LOAD_GPIO: u8 = 27;

// ---------------------------------------------------------------------------
// Pins reserved by the ESP32 itself
// ---------------------------------------------------------------------------

/// Bootstrap, UART0 and on-chip flash pins.
pub const ESP32_RESERVED_GPIOS: [u8; 13] = [
    0, // Bootstrap / firmware download
    1, // UART0 TX
    2, // Bootstrap / firmware download
    3, // UART0 RX
    5, // Bootstrap
    6, 7, 8, 9, 10, 11, // on-chip flash
    12, 15, // Bootstrap / SD
];

// ---------------------------------------------------------------------------
// DCC signal generation (owned by the track subsystem)
// ---------------------------------------------------------------------------

pub const OPS_ENABLE_GPIO: u8 = 25;
pub const OPS_SIGNAL_GPIO: u8 = 19;
pub const PROG_ENABLE_GPIO: u8 = 23;
pub const PROG_SIGNAL_GPIO: u8 = 18;

/// Every pin owned by a subsystem other than the S88 buses.
pub const SUBSYSTEM_GPIOS: [u8; 4] = [
    OPS_ENABLE_GPIO,
    OPS_SIGNAL_GPIO,
    PROG_ENABLE_GPIO,
    PROG_SIGNAL_GPIO,
];

/// Highest GPIO number on the ESP32.
pub const MAX_GPIO: u8 = 39;
