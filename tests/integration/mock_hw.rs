//! Mock adapters for integration tests.
//!
//! Records every pin operation and broadcast line so tests can assert on
//! the full history without touching real GPIO registers.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};

use embedded_hal::delay::DelayNs;
use s88bus::app::events::BusEvent;
use s88bus::app::ports::{BusEventSink, GpioPort, StorageError, StoragePort};

// ── Pin call record ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCall {
    Output(u8),
    Input(u8),
    Set(u8, bool),
    Read(u8),
}

// ── RecordingGpio ─────────────────────────────────────────────

/// Records every call; data pins listed in `low` read low, all others high.
#[derive(Debug, Default)]
pub struct RecordingGpio {
    pub calls: Vec<PinCall>,
    pub low: Vec<u8>,
}

#[allow(dead_code)]
impl RecordingGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads_of(&self, pin: u8) -> usize {
        self.calls.iter().filter(|&&c| c == PinCall::Read(pin)).count()
    }

    pub fn rises_of(&self, pin: u8) -> usize {
        self.calls.iter().filter(|&&c| c == PinCall::Set(pin, true)).count()
    }
}

impl GpioPort for RecordingGpio {
    fn configure_output(&mut self, pin: u8) {
        self.calls.push(PinCall::Output(pin));
    }

    fn configure_input(&mut self, pin: u8) {
        self.calls.push(PinCall::Input(pin));
    }

    fn set_level(&mut self, pin: u8, high: bool) {
        self.calls.push(PinCall::Set(pin, high));
    }

    fn read_level(&mut self, pin: u8) -> bool {
        self.calls.push(PinCall::Read(pin));
        !self.low.contains(&pin)
    }
}

// ── GatedGpio ─────────────────────────────────────────────────

/// Every data-line read announces itself on `entered` and then blocks
/// until the test sends on the release channel.
pub struct GatedGpio {
    entered: Sender<()>,
    release: Receiver<()>,
}

impl GatedGpio {
    pub fn new(entered: Sender<()>, release: Receiver<()>) -> Self {
        Self { entered, release }
    }
}

impl GpioPort for GatedGpio {
    fn configure_output(&mut self, _pin: u8) {}
    fn configure_input(&mut self, _pin: u8) {}
    fn set_level(&mut self, _pin: u8, _high: bool) {}

    fn read_level(&mut self, _pin: u8) -> bool {
        let _ = self.entered.send(());
        let _ = self.release.recv();
        true
    }
}

// ── Lines ─────────────────────────────────────────────────────

/// Sink capturing rendered protocol lines.
#[derive(Debug, Default)]
pub struct Lines(pub Vec<String>);

impl BusEventSink for Lines {
    fn emit(&mut self, event: &BusEvent) {
        self.0.push(event.to_string());
    }
}

// ── NoDelay ───────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── MockStorage ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockStorage {
    pub data: HashMap<String, Vec<u8>>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, namespace: &str, key: &str) -> Option<&[u8]> {
        self.data.get(&format!("{namespace}::{key}")).map(Vec::as_slice)
    }

    pub fn put(&mut self, namespace: &str, key: &str, data: &[u8]) {
        self.data.insert(format!("{namespace}::{key}"), data.to_vec());
    }
}

impl StoragePort for MockStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self.raw(namespace, key).ok_or(StorageError::NotFound)?;
        if data.len() > buf.len() {
            return Err(StorageError::TooLarge);
        }
        buf[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.put(namespace, key, data);
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&format!("{namespace}::{key}"));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.raw(namespace, key).is_some()
    }
}
