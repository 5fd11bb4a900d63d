//! Bus-owned sensor and the global sensor index.
//!
//! A [`Sensor`] lives inside exactly one [`SensorBus`](super::bus::SensorBus).
//! The [`SensorIndex`] maps external sensor IDs to a non-owning
//! [`SensorHandle`] so the generic sensor surface can find and report a
//! bus sensor without owning it.

use std::collections::BTreeMap;
use std::ops::Range;

use log::trace;

use crate::error::BusError;

/// One input of an S88 shift-register chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    id: u32,
    position: u16,
    active: bool,
}

impl Sensor {
    pub(crate) fn new(id: u32, position: u16) -> Self {
        trace!("S88: sensor {} created at position {}", id, position);
        Self {
            id,
            position,
            active: false,
        }
    }

    /// External sensor ID used by the reporting surface.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Shift position within the owning bus.
    pub fn position(&self) -> u16 {
        self.position
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Bus sensors have no pin of their own.
    pub fn is_bus_owned(&self) -> bool {
        true
    }

    pub(crate) fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    /// Store a sampled state.  Returns `true` if it changed.
    pub(crate) fn set_active(&mut self, active: bool) -> bool {
        if self.active == active {
            return false;
        }
        self.active = active;
        true
    }
}

/// Where a bus sensor lives: bus ID plus shift position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorHandle {
    pub bus: u8,
    pub position: u16,
}

/// Entry kinds of the process-wide sensor index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Owned by an S88 bus; only the bus registry may mutate it.
    BusOwned(SensorHandle),
}

/// Process-wide sensor ID index.
#[derive(Debug, Default)]
pub struct SensorIndex {
    entries: BTreeMap<u32, SensorKind>,
}

impl SensorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_bus_sensor(&mut self, id: u32, handle: SensorHandle) {
        self.entries.insert(id, SensorKind::BusOwned(handle));
    }

    pub(crate) fn remove(&mut self, id: u32) -> Option<SensorKind> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: u32) -> Option<SensorKind> {
        self.entries.get(&id).copied()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First ID in `ids` indexed to a bus other than `bus`, with its owner.
    pub(crate) fn foreign_owner(&self, ids: Range<u32>, bus: u8) -> Option<(u32, u8)> {
        self.entries.range(ids).find_map(|(&id, kind)| match *kind {
            SensorKind::BusOwned(handle) if handle.bus != bus => Some((id, handle.bus)),
            SensorKind::BusOwned(_) => None,
        })
    }

    /// IDs currently indexed, ascending.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    /// Generic create/edit/delete commands must call this first: a bus
    /// sensor can be queried through the generic surface but never changed.
    pub fn ensure_generic_mutable(&self, id: u32) -> Result<(), BusError> {
        match self.get(id) {
            Some(SensorKind::BusOwned(_)) => Err(BusError::BusOwnedSensor(id)),
            None => Ok(()),
        }
    }
}
