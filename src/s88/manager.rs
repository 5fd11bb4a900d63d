//! S88 bus manager — the registry, the pins, and the scan task behind one
//! lock.
//!
//! ```text
//!  command thread ──┐                         ┌── scan task (pri 1)
//!                   ▼                         ▼
//!            ┌──────────────── bus lock ────────────────┐
//!            │  BusRegistry · GpioPort · BusEventSink   │
//!            └──────────────────────────────────────────┘
//! ```
//!
//! The scan task holds the lock for a whole cycle and every registry
//! mutation holds it for its whole duration, so a scan never sees a bus
//! half-resized and a mutation waits at most one cycle.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use super::persist::{MAX_BLOB_SIZE, PersistedBuses, S88_BUSES_KEY, S88_NAMESPACE};
use super::registry::{BusRegistry, Upserted};
use super::scan::{CycleReport, ScanEngine};
use crate::app::commands::S88Command;
use crate::app::events::{BusEvent, Reply};
use crate::app::ports::{BusEventSink, GpioPort, PinGuard, StorageError, StoragePort};
use crate::config::S88Config;
use crate::drivers::task_pin::{Core, spawn_on_core};
use crate::error::BusError;

/// Scan task priority (lowest application priority).
const SCAN_TASK_PRIORITY: u8 = 1;
/// Scan task stack in KiB.
const SCAN_TASK_STACK_KB: usize = 6;

/// Everything the bus lock protects.
pub struct BusState<G, S> {
    pub registry: BusRegistry,
    pub gpio: G,
    pub sink: S,
}

/// Shared handle to the S88 subsystem.  Cloning is cheap; all clones
/// share one registry and one lock.
pub struct S88BusManager<G, S> {
    config: S88Config,
    state: Arc<Mutex<BusState<G, S>>>,
    guard: Arc<dyn PinGuard + Send + Sync>,
}

impl<G, S> Clone for S88BusManager<G, S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            guard: Arc::clone(&self.guard),
        }
    }
}

impl<G: GpioPort, S: BusEventSink> S88BusManager<G, S> {
    pub fn new(
        config: S88Config,
        gpio: G,
        sink: S,
        guard: impl PinGuard + Send + Sync + 'static,
    ) -> Self {
        let registry = BusRegistry::new(&config);
        Self {
            config,
            state: Arc::new(Mutex::new(BusState { registry, gpio, sink })),
            guard: Arc::new(guard),
        }
    }

    pub fn config(&self) -> &S88Config {
        &self.config
    }

    /// Acquire the bus lock.  A panic inside a critical section cannot
    /// leave a half-applied mutation behind, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, BusState<G, S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Start-up ──────────────────────────────────────────────

    /// Load the stored bus list.  Must run before [`start_scanner`].
    /// A missing blob is an empty registry.
    ///
    /// [`start_scanner`]: Self::start_scanner
    pub fn init(&self, storage: &impl StoragePort) -> crate::Result<usize> {
        info!(
            "S88: configuration (clock: {}, reset: {}, load: {})",
            self.config.clock_pin, self.config.reset_pin, self.config.load_pin
        );
        let mut buf = vec![0u8; MAX_BLOB_SIZE];
        let persisted = match storage.read(S88_NAMESPACE, S88_BUSES_KEY, &mut buf) {
            Ok(len) => PersistedBuses::from_json(&buf[..len])?,
            Err(StorageError::NotFound) => {
                info!("S88: no stored bus list");
                PersistedBuses::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(self.load(&persisted))
    }

    /// Rebuild buses from a persisted list and configure their data pins.
    pub fn load(&self, persisted: &PersistedBuses) -> usize {
        let mut state = self.lock();
        let BusState { registry, gpio, .. } = &mut *state;
        let loaded = registry.load(persisted);
        for bus in registry.buses() {
            gpio.configure_input(bus.data_pin());
        }
        loaded
    }

    // ── Registry mutation ─────────────────────────────────────

    /// Upsert bus `id`; broadcasts the bus line on success.
    pub fn create_or_update(&self, id: u8, data_pin: u8, count: u16) -> Result<Upserted, BusError> {
        let mut state = self.lock();
        let BusState { registry, gpio, sink } = &mut *state;
        let outcome = registry.create_or_update(id, data_pin, count, self.guard.as_ref())?;
        gpio.configure_input(data_pin);
        if let Some(bus) = registry.bus(id) {
            sink.emit(&BusEvent::BusShown {
                id,
                pin: bus.data_pin(),
                count: bus.sensor_count(),
            });
        }
        Ok(outcome)
    }

    /// Remove bus `id` and all of its sensors.
    pub fn remove(&self, id: u8) -> Result<(), BusError> {
        self.lock().registry.remove(id).map(|_| ())
    }

    /// Remove every bus (factory reset).
    pub fn clear(&self) {
        self.lock().registry.clear();
        info!("S88: all buses cleared");
    }

    // ── Persistence ───────────────────────────────────────────

    /// Write the bus list to storage.  Returns the number of buses stored.
    pub fn store(&self, storage: &mut impl StoragePort) -> crate::Result<usize> {
        let persisted = self.lock().registry.to_persisted();
        let bytes = persisted.to_json()?;
        if bytes.len() > MAX_BLOB_SIZE {
            warn!("S88: bus list is {} bytes, limit {}", bytes.len(), MAX_BLOB_SIZE);
            return Err(StorageError::TooLarge.into());
        }
        storage.write(S88_NAMESPACE, S88_BUSES_KEY, &bytes)?;
        info!("S88: stored {} buses", persisted.count);
        Ok(persisted.count)
    }

    /// Persisted form of the current registry.
    pub fn to_persisted(&self) -> PersistedBuses {
        self.lock().registry.to_persisted()
    }

    // ── Queries ───────────────────────────────────────────────

    /// JSON array describing every bus, optionally with its sensor bits.
    pub fn describe(&self, include_state: bool) -> String {
        let status = self.lock().registry.describe(include_state);
        serde_json::to_string(&status).unwrap_or_else(|_| String::from("[]"))
    }

    /// Broadcast every bus line followed by its sensors' state lines.
    pub fn list(&self) {
        let mut state = self.lock();
        let BusState { registry, sink, .. } = &mut *state;
        for bus in registry.buses() {
            sink.emit(&BusEvent::BusShown {
                id: bus.id(),
                pin: bus.data_pin(),
                count: bus.sensor_count(),
            });
            for sensor in bus.sensors() {
                sink.emit(&BusEvent::sensor_state(sensor.id(), sensor.is_active()));
            }
        }
    }

    /// Active state of a bus sensor, `None` if `id` is not a bus sensor.
    pub fn sensor_state(&self, id: u32) -> Option<bool> {
        self.lock().registry.sensor(id).map(|s| s.is_active())
    }

    pub fn is_bus_sensor(&self, id: u32) -> bool {
        self.lock().registry.index().contains(id)
    }

    /// Gate for the generic sensor commands: bus sensors are read-only there.
    pub fn ensure_generic_mutable(&self, id: u32) -> Result<(), BusError> {
        self.lock().registry.index().ensure_generic_mutable(id)
    }

    pub fn bus_count(&self) -> usize {
        self.lock().registry.len()
    }

    // ── Command surface ───────────────────────────────────────

    /// Execute one `S88` command.  Listing replies through broadcasts only.
    pub fn handle(&self, cmd: S88Command) -> Option<Reply> {
        match cmd {
            S88Command::List => {
                self.list();
                None
            }
            S88Command::Remove { id } => Some(Reply::from_success(self.remove(id).is_ok())),
            S88Command::CreateOrUpdate { id, data_pin, count } => Some(Reply::from_success(
                self.create_or_update(id, data_pin, count).is_ok(),
            )),
        }
    }

    /// Parse and execute the arguments that followed `S88`.
    pub fn handle_args(&self, args: &[&str]) -> Option<Reply> {
        match S88Command::from_args(args) {
            Some(cmd) => self.handle(cmd),
            None => {
                warn!("S88: malformed command arguments {:?}", args);
                Some(Reply::Failed)
            }
        }
    }

    // ── Scanning ──────────────────────────────────────────────

    /// Run one scan cycle under the bus lock.
    pub fn scan_once<D: DelayNs>(&self, engine: &mut ScanEngine<D>) -> CycleReport {
        let mut state = self.lock();
        let BusState { registry, gpio, sink } = &mut *state;
        engine.run_cycle(registry, gpio, sink)
    }
}

impl<G, S> S88BusManager<G, S>
where
    G: GpioPort + Send + 'static,
    S: BusEventSink + Send + 'static,
{
    /// Drive the control lines low and spawn the scan task.  The task runs
    /// one cycle every `scan_interval_ms` for the life of the process.
    pub fn start_scanner<D>(&self, delay: D) -> io::Result<JoinHandle<()>>
    where
        D: DelayNs + Send + 'static,
    {
        let mut engine = ScanEngine::new(&self.config, delay);
        engine.init_lines(&mut self.lock().gpio);
        let interval = Duration::from_millis(u64::from(self.config.scan_interval_ms));
        let manager = self.clone();
        info!("S88: starting scan task ({} ms interval)", self.config.scan_interval_ms);
        spawn_on_core(
            Core::App,
            SCAN_TASK_PRIORITY,
            SCAN_TASK_STACK_KB,
            "s88-scan\0",
            move || {
                loop {
                    manager.scan_once(&mut engine);
                    std::thread::sleep(interval);
                }
            },
        )
    }
}
