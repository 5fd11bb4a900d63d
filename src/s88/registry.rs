//! In-memory bus registry.
//!
//! Owns every [`SensorBus`] keyed by bus ID together with the global
//! [`SensorIndex`].  All checks run before any mutation, so a rejected
//! request leaves the registry exactly as it was.  The registry itself is
//! not synchronised; [`S88BusManager`](super::manager::S88BusManager) wraps
//! it in the bus lock.

use std::collections::BTreeMap;
use std::ops::Range;

use log::{info, warn};

use super::bus::SensorBus;
use super::persist::{BusRecord, BusStatus, PersistedBuses};
use super::sensor::{Sensor, SensorIndex, SensorKind};
use crate::app::ports::PinGuard;
use crate::config::S88Config;
use crate::error::BusError;

/// What a successful `create_or_update` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Created,
    Updated,
}

#[derive(Debug)]
pub struct BusRegistry {
    config: S88Config,
    buses: BTreeMap<u8, SensorBus>,
    index: SensorIndex,
}

impl BusRegistry {
    pub fn new(config: &S88Config) -> Self {
        Self {
            config: config.clone(),
            buses: BTreeMap::new(),
            index: SensorIndex::new(),
        }
    }

    /// First sensor ID of bus `id`.
    pub fn sensor_base(&self, id: u8) -> u32 {
        self.config.sensor_base(id)
    }

    fn id_window(base: u32, count: u16) -> Option<Range<u32>> {
        Some(base..base.checked_add(u32::from(count))?)
    }

    // ── Mutation ──────────────────────────────────────────────

    /// Upsert bus `id`.
    ///
    /// Rejects a data pin used by a different bus, a sensor count larger
    /// than the per-bus ID window, sensor IDs already owned by another bus,
    /// and, for new buses only, restricted pins.  An existing bus keeps its
    /// sensor base.
    pub fn create_or_update(
        &mut self,
        id: u8,
        data_pin: u8,
        count: u16,
        guard: &dyn PinGuard,
    ) -> Result<Upserted, BusError> {
        if let Some(owner) = self.pin_owner(data_pin).filter(|&owner| owner != id) {
            warn!(
                "S88: bus {} already uses data pin {}, rejecting bus {}",
                owner, data_pin, id
            );
            return Err(BusError::PinConflict { pin: data_pin, owner });
        }
        let max = self.config.max_sensors_per_bus;
        if count > max {
            warn!("S88: bus {} asked for {} sensors (max {})", id, count, max);
            return Err(BusError::TooManySensors { requested: count, max });
        }

        let existing_base = self.buses.get(&id).map(SensorBus::sensor_base);
        if existing_base.is_none() && guard.is_restricted(data_pin) {
            warn!("S88: bus {} rejected, pin {} is restricted", id, data_pin);
            return Err(BusError::RestrictedPin(data_pin));
        }
        let base = existing_base.unwrap_or_else(|| self.sensor_base(id));
        let Some(ids) = Self::id_window(base, count) else {
            warn!("S88: bus {} rejected, {} sensors from {} overflow", id, count, base);
            return Err(BusError::SensorIdOutOfRange(id));
        };
        if let Some((sensor, owner)) = self.index.foreign_owner(ids, id) {
            warn!(
                "S88: bus {} rejected, sensor {} belongs to bus {}",
                id, sensor, owner
            );
            return Err(BusError::SensorIdOverlap { sensor, owner });
        }

        if let Some(bus) = self.buses.get_mut(&id) {
            bus.set_data_pin(data_pin);
            bus.resize(count, &mut self.index);
            info!(
                "S88 bus {}: updated to data pin {} with {} sensors",
                id,
                data_pin,
                bus.sensor_count()
            );
            return Ok(Upserted::Updated);
        }

        let bus = SensorBus::new(id, data_pin, base, count, &mut self.index);
        info!(
            "S88 bus {}: created on data pin {} with {} sensors starting at {}",
            id, data_pin, count, base
        );
        self.buses.insert(id, bus);
        Ok(Upserted::Created)
    }

    /// Remove bus `id` and every sensor it owns.
    pub fn remove(&mut self, id: u8) -> Result<BusRecord, BusError> {
        let mut bus = self.buses.remove(&id).ok_or(BusError::UnknownBus(id))?;
        let record = Self::record_of(&bus);
        bus.detach_all(&mut self.index);
        info!("S88 bus {}: removed", id);
        Ok(record)
    }

    /// Remove every bus.
    pub fn clear(&mut self) {
        for (_, mut bus) in core::mem::take(&mut self.buses) {
            bus.detach_all(&mut self.index);
            info!("S88 bus {}: removed", bus.id());
        }
    }

    // ── Persistence ───────────────────────────────────────────

    /// Ordered bus records for storage.
    pub fn to_persisted(&self) -> PersistedBuses {
        PersistedBuses::new(self.buses.values().map(Self::record_of).collect())
    }

    /// Rebuild buses from stored records, keeping each record's sensor base.
    /// Records that would break bus ID, pin, or sensor ID uniqueness,
    /// exceed the per-bus window, or run past the ID range are skipped.  Returns the number of buses loaded.
    pub fn load(&mut self, persisted: &PersistedBuses) -> usize {
        let mut loaded = 0;
        for record in &persisted.sensors {
            if self.buses.contains_key(&record.id) {
                warn!("S88: skipping duplicate stored bus {}", record.id);
                continue;
            }
            if let Some(owner) = self.pin_owner(record.pin) {
                warn!(
                    "S88: skipping stored bus {}, data pin {} belongs to bus {}",
                    record.id, record.pin, owner
                );
                continue;
            }
            if record.count > self.config.max_sensors_per_bus {
                warn!(
                    "S88: skipping stored bus {}, {} sensors exceeds {}",
                    record.id, record.count, self.config.max_sensors_per_bus
                );
                continue;
            }
            let Some(ids) = Self::id_window(record.sensor_base, record.count) else {
                warn!(
                    "S88: skipping stored bus {}, {} sensors from {} overflow",
                    record.id, record.count, record.sensor_base
                );
                continue;
            };
            if let Some((sensor, owner)) = self.index.foreign_owner(ids, record.id) {
                warn!(
                    "S88: skipping stored bus {}, sensor {} belongs to bus {}",
                    record.id, sensor, owner
                );
                continue;
            }
            let bus = SensorBus::new(
                record.id,
                record.pin,
                record.sensor_base,
                record.count,
                &mut self.index,
            );
            self.buses.insert(record.id, bus);
            loaded += 1;
        }
        info!("S88: loaded {} sensor buses", loaded);
        loaded
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn describe(&self, include_state: bool) -> Vec<BusStatus> {
        self.buses
            .values()
            .map(|bus| BusStatus {
                record: Self::record_of(bus),
                state: include_state.then(|| bus.state_string()),
            })
            .collect()
    }

    pub fn bus(&self, id: u8) -> Option<&SensorBus> {
        self.buses.get(&id)
    }

    /// Buses in ID order.
    pub fn buses(&self) -> impl Iterator<Item = &SensorBus> {
        self.buses.values()
    }

    pub(crate) fn buses_mut(&mut self) -> impl Iterator<Item = &mut SensorBus> {
        self.buses.values_mut()
    }

    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }

    pub fn index(&self) -> &SensorIndex {
        &self.index
    }

    /// Look up a bus sensor by external ID.
    pub fn sensor(&self, id: u32) -> Option<&Sensor> {
        let SensorKind::BusOwned(handle) = self.index.get(id)?;
        self.buses
            .get(&handle.bus)?
            .sensors()
            .get(handle.position as usize)
    }

    fn pin_owner(&self, pin: u8) -> Option<u8> {
        self.buses
            .values()
            .find(|bus| bus.data_pin() == pin)
            .map(SensorBus::id)
    }

    fn record_of(bus: &SensorBus) -> BusRecord {
        BusRecord {
            id: bus.id(),
            pin: bus.data_pin(),
            sensor_base: bus.sensor_base(),
            count: bus.sensor_count(),
        }
    }
}
