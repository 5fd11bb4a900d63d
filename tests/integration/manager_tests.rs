//! Bus manager: command surface, persistence, and the bus lock shared
//! with the scan task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use s88bus::adapters::gpio::SimGpio;
use s88bus::app::events::Reply;
use s88bus::app::ports::RestrictedPins;
use s88bus::config::S88Config;
use s88bus::error::Error;
use s88bus::s88::persist::{S88_BUSES_KEY, S88_NAMESPACE};
use s88bus::s88::{S88BusManager, ScanEngine, Upserted};

use crate::mock_hw::{GatedGpio, Lines, MockStorage, NoDelay, PinCall, RecordingGpio};

fn manager() -> S88BusManager<RecordingGpio, Lines> {
    S88BusManager::new(
        S88Config::default(),
        RecordingGpio::new(),
        Lines::default(),
        RestrictedPins::none(),
    )
}

// ── Command surface ───────────────────────────────────────────

#[test]
fn create_configures_data_pin_and_announces_bus() {
    let m = manager();
    assert_eq!(m.handle_args(&["1", "25", "8"]), Some(Reply::Ok));

    let state = m.lock();
    assert!(state.gpio.calls.contains(&PinCall::Input(25)));
    assert_eq!(state.sink.0, vec!["<S88 1 25 8>"]);
}

#[test]
fn pin_conflict_replies_failure_without_broadcast() {
    let m = manager();
    m.handle_args(&["1", "25", "8"]);
    assert_eq!(m.handle_args(&["2", "25", "4"]), Some(Reply::Failed));
    assert_eq!(m.lock().sink.0.len(), 1);
    assert_eq!(m.bus_count(), 1);
}

#[test]
fn remove_unknown_bus_fails() {
    let m = manager();
    assert_eq!(m.handle_args(&["4"]), Some(Reply::Failed));
}

#[test]
fn board_guard_blocks_control_lines() {
    let config = S88Config::default();
    let guard = RestrictedPins::for_board(&config);
    let m = S88BusManager::new(config.clone(), RecordingGpio::new(), Lines::default(), guard);
    let load = config.load_pin.to_string();
    assert_eq!(m.handle_args(&["0", load.as_str(), "8"]), Some(Reply::Failed));
    assert!(m.lock().sink.0.is_empty());
}

#[test]
fn list_has_no_direct_reply() {
    let m = manager();
    m.create_or_update(0, 4, 1).unwrap();
    m.create_or_update(1, 13, 1).unwrap();
    m.lock().sink.0.clear();

    assert_eq!(m.handle_args(&[]), None);
    assert_eq!(
        m.lock().sink.0,
        vec!["<S88 0 4 1>", "<q 512>", "<S88 1 13 1>", "<q 1024>"]
    );
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn store_writes_json_blob() {
    let m = manager();
    m.create_or_update(1, 25, 8).unwrap();
    let mut storage = MockStorage::new();
    assert_eq!(m.store(&mut storage).unwrap(), 1);
    assert_eq!(
        storage.raw(S88_NAMESPACE, S88_BUSES_KEY).unwrap(),
        br#"{"count":1,"sensors":[{"id":1,"pin":25,"s88base":1024,"count":8}]}"#
    );
}

#[test]
fn store_failure_is_reported() {
    let m = manager();
    let mut storage = MockStorage { fail_writes: true, ..MockStorage::new() };
    assert!(matches!(m.store(&mut storage), Err(Error::Storage(_))));
}

#[test]
fn init_restores_buses_and_configures_pins() {
    let mut storage = MockStorage::new();
    storage.put(
        S88_NAMESPACE,
        S88_BUSES_KEY,
        br#"{"count":2,"sensors":[{"id":0,"pin":4,"s88base":512,"count":2},{"id":3,"pin":13,"s88base":2048,"count":4}]}"#,
    );
    let m = manager();
    assert_eq!(m.init(&storage).unwrap(), 2);
    assert!(m.is_bus_sensor(2051));
    let state = m.lock();
    assert!(state.gpio.calls.contains(&PinCall::Input(4)));
    assert!(state.gpio.calls.contains(&PinCall::Input(13)));
}

#[test]
fn corrupt_blob_fails_init() {
    let mut storage = MockStorage::new();
    storage.put(S88_NAMESPACE, S88_BUSES_KEY, b"[[[");
    assert!(matches!(manager().init(&storage), Err(Error::Persist(_))));
}

#[test]
fn clear_then_store_leaves_empty_list() {
    let m = manager();
    m.create_or_update(1, 25, 8).unwrap();
    m.clear();
    let mut storage = MockStorage::new();
    assert_eq!(m.store(&mut storage).unwrap(), 0);
    assert!(!m.is_bus_sensor(1024));
}

// ── Concurrency ───────────────────────────────────────────────

#[test]
fn mutation_waits_for_running_scan() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let m = S88BusManager::new(
        S88Config::default(),
        GatedGpio::new(entered_tx, release_rx),
        Lines::default(),
        RestrictedPins::none(),
    );
    m.create_or_update(1, 4, 2).unwrap();

    let scanner = m.clone();
    let scan = thread::spawn(move || {
        let mut engine = ScanEngine::new(scanner.config(), NoDelay);
        scanner.scan_once(&mut engine)
    });
    // The scan is now blocked inside its first data-line read.
    entered_rx.recv().unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let mutator = m.clone();
    let flag = Arc::clone(&done);
    let update = thread::spawn(move || {
        let result = mutator.create_or_update(1, 4, 8);
        flag.store(true, Ordering::SeqCst);
        result
    });

    thread::sleep(Duration::from_millis(100));
    assert!(!done.load(Ordering::SeqCst), "update finished during a scan");

    release_tx.send(()).unwrap();
    release_tx.send(()).unwrap();
    let report = scan.join().unwrap();
    assert_eq!(report.samples, 2);

    assert_eq!(update.join().unwrap(), Ok(Upserted::Updated));
    assert_eq!(m.lock().registry.bus(1).unwrap().sensor_count(), 8);
}

#[test]
fn background_scanner_reports_occupied_sensor() {
    let config = S88Config { scan_interval_ms: 10, ..S88Config::default() };
    let m = S88BusManager::new(config, SimGpio::new(), Lines::default(), RestrictedPins::none());
    m.create_or_update(1, 4, 3).unwrap();
    m.lock().gpio.set_input(4, false);

    let _scanner = m.start_scanner(NoDelay).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while m.sensor_state(1024) != Some(true) {
        assert!(Instant::now() < deadline, "scan task never ran");
        thread::sleep(Duration::from_millis(5));
    }
    assert!(m.lock().sink.0.contains(&"<Q 1026>".to_string()));
}
