//! One S88 shift-register chain.
//!
//! A bus owns its sensors in shift order and keeps a read cursor that is
//! only meaningful while a scan cycle is in progress.  Every structural
//! change goes through the [`SensorIndex`] passed in by the registry, so
//! index membership and bus membership never diverge.

use log::{debug, trace};

use super::sensor::{Sensor, SensorHandle, SensorIndex};
use crate::config::ActiveLevel;

#[derive(Debug)]
pub struct SensorBus {
    id: u8,
    data_pin: u8,
    sensor_base: u32,
    sensors: Vec<Sensor>,
    cursor: usize,
}

impl SensorBus {
    /// Build a bus with `count` sensors numbered from `sensor_base`.
    ///
    /// The registry guarantees `sensor_base + count` fits in `u32`, here and
    /// before every [`resize`](Self::resize).
    pub(crate) fn new(
        id: u8,
        data_pin: u8,
        sensor_base: u32,
        count: u16,
        index: &mut SensorIndex,
    ) -> Self {
        let mut bus = Self {
            id,
            data_pin,
            sensor_base,
            sensors: Vec::with_capacity(count as usize),
            cursor: 0,
        };
        bus.add_sensors(count as usize, index);
        bus
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn data_pin(&self) -> u8 {
        self.data_pin
    }

    pub fn sensor_base(&self) -> u32 {
        self.sensor_base
    }

    pub fn sensor_count(&self) -> u16 {
        self.sensors.len() as u16
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub(crate) fn set_data_pin(&mut self, pin: u8) {
        self.data_pin = pin;
    }

    /// Renumber surviving sensors from the base, then grow or shrink at
    /// the tail to `count`.
    pub(crate) fn resize(&mut self, count: u16, index: &mut SensorIndex) {
        for (position, sensor) in self.sensors.iter_mut().enumerate() {
            let id = self.sensor_base + position as u32;
            if sensor.id() != id {
                index.remove(sensor.id());
                sensor.set_id(id);
                index.insert_bus_sensor(
                    id,
                    SensorHandle {
                        bus: self.id,
                        position: position as u16,
                    },
                );
            }
        }

        let target = count as usize;
        if target < self.sensors.len() {
            self.remove_tail(self.sensors.len() - target, index);
        } else {
            self.add_sensors(target - self.sensors.len(), index);
        }
    }

    /// Remove every sensor from the bus and the index.
    pub(crate) fn detach_all(&mut self, index: &mut SensorIndex) {
        for sensor in self.sensors.drain(..) {
            trace!("S88: sensor {} removed", sensor.id());
            index.remove(sensor.id());
        }
        self.cursor = 0;
    }

    fn add_sensors(&mut self, n: usize, index: &mut SensorIndex) {
        let start = self.sensors.len();
        for position in start..start + n {
            let id = self.sensor_base + position as u32;
            let position = position as u16;
            index.insert_bus_sensor(id, SensorHandle { bus: self.id, position });
            self.sensors.push(Sensor::new(id, position));
        }
        if n > 0 {
            debug!("S88 bus {}: added {} sensors", self.id, n);
        }
    }

    fn remove_tail(&mut self, n: usize, index: &mut SensorIndex) {
        for _ in 0..n {
            if let Some(sensor) = self.sensors.pop() {
                trace!("S88: sensor {} removed", sensor.id());
                index.remove(sensor.id());
            }
        }
        debug!("S88 bus {}: removed {} sensors", self.id, n);
    }

    // ── Scan cursor ───────────────────────────────────────────

    /// Rewind the cursor to shift position 0.
    pub(crate) fn prepare_for_read(&mut self) {
        self.cursor = 0;
    }

    /// Whether any sensor is still unread in this cycle.
    pub(crate) fn has_more(&self) -> bool {
        self.cursor < self.sensors.len()
    }

    /// Current cursor (number of sensors read this cycle).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Record one sampled data-line level for the sensor under the cursor
    /// and advance.  Returns the sensor ID and new state on a transition.
    pub(crate) fn read_next(&mut self, level_high: bool, polarity: ActiveLevel) -> Option<(u32, bool)> {
        let sensor = self.sensors.get_mut(self.cursor)?;
        self.cursor += 1;
        let active = polarity.is_active(level_high);
        sensor.set_active(active).then(|| (sensor.id(), active))
    }

    /// Sensor states in shift order, `'1'` = active.
    pub fn state_string(&self) -> String {
        self.sensors
            .iter()
            .map(|s| if s.is_active() { '1' } else { '0' })
            .collect()
    }
}
