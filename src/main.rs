//! S88 sensor bus firmware — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │   EspGpio        NvsAdapter         ChannelSink          │
//! │   (GpioPort)     (Config+Storage)   + LogEventSink       │
//! │                                                          │
//! │  ──────────────── Port Trait Boundary ──────────────     │
//! │                                                          │
//! │   ┌──────────────────────────────────────────────────┐   │
//! │   │  S88BusManager: BusRegistry · ScanEngine         │   │
//! │   └──────────────────────────────────────────────────┘   │
//! │                                                          │
//! │   scan task (App core, pri 1) · console · broadcaster    │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::delay::Ets;
use log::{debug, info, warn};

use s88bus::adapters::channel_sink::{self, BROADCAST_CHANNEL, ChannelSink};
use s88bus::adapters::gpio::EspGpio;
use s88bus::adapters::log_sink::LogEventSink;
use s88bus::adapters::nvs::NvsAdapter;
use s88bus::app::ports::RestrictedPins;
use s88bus::config::S88Config;
use s88bus::drivers::task_pin::{Core, spawn_on_core};
use s88bus::s88::S88BusManager;

/// How often the broadcaster drains the outbound queue.
const BROADCAST_POLL: Duration = Duration::from_millis(10);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("S88 sensor bus v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Load scan config from NVS (or defaults) ────────────
    let mut nvs = NvsAdapter::new()?;
    let config = match S88Config::from_port(&nvs) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            S88Config::default()
        }
    };

    // ── 3. Bus manager ────────────────────────────────────────
    let guard = RestrictedPins::for_board(&config);
    let manager = S88BusManager::new(
        config,
        EspGpio::new(),
        (ChannelSink::global(), LogEventSink::new()),
        guard,
    );
    let loaded = manager.init(&nvs)?;
    info!("S88: {} buses restored", loaded);
    debug!("S88: {}", manager.describe(false));

    // ── 4. Tasks ──────────────────────────────────────────────
    manager.start_scanner(Ets)?;
    spawn_on_core(Core::Pro, 2, 4, "s88-bcast\0", || {
        loop {
            channel_sink::drain(&BROADCAST_CHANNEL, |line| println!("{line}"));
            std::thread::sleep(BROADCAST_POLL);
        }
    })?;

    // ── 5. Console command loop ───────────────────────────────
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let body = line.trim().trim_start_matches('<').trim_end_matches('>');
        let mut words = body.split_whitespace();
        let reply = match words.next() {
            Some("S88") => {
                let args: Vec<&str> = words.collect();
                manager.handle_args(&args).map(|r| r.as_str())
            }
            Some("E") => Some(match manager.store(&mut nvs) {
                Ok(_) => "<O>",
                Err(e) => {
                    warn!("S88: store failed: {}", e);
                    "<X>"
                }
            }),
            Some("e") => {
                manager.clear();
                Some(match manager.store(&mut nvs) {
                    Ok(_) => "<O>",
                    Err(_) => "<X>",
                })
            }
            Some(other) => {
                debug!("console: ignoring '{}'", other);
                None
            }
            None => None,
        };
        if let Some(reply) = reply {
            println!("{reply}");
            std::io::stdout().flush()?;
        }
    }
    Ok(())
}
