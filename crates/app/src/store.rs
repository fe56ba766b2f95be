//! Device state store: last known sensor readings and valve statuses.

use std::collections::BTreeMap;

use serde::Serialize;

use irrihub_domain::sensor::SensorReading;
use irrihub_domain::valve::{ValveState, ValveStatus, ValveStatusPatch};

/// Read-only copy of every device's latest state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub sensors: Vec<SensorReading>,
    pub valves: Vec<ValveStatus>,
}

/// Latest state per device, keyed by device id.
#[derive(Debug, Clone, Default)]
pub struct DeviceStateStore {
    sensors: BTreeMap<String, SensorReading>,
    valves: BTreeMap<String, ValveStatus>,
}

impl DeviceStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot of the reading's sensor.
    pub fn upsert_sensor(&mut self, reading: SensorReading) -> &SensorReading {
        let id = reading.device_id.clone();
        self.sensors.insert(id.clone(), reading);
        &self.sensors[&id]
    }

    /// Overlay `patch` on the valve, creating a closed one if unknown.
    pub fn upsert_valve(&mut self, valve_id: &str, patch: ValveStatusPatch) -> &ValveStatus {
        let status = self
            .valves
            .entry(valve_id.to_string())
            .or_insert_with(|| ValveStatus::new(valve_id));
        status.merge(patch);
        status
    }

    /// Make sure the valve has an entry, leaving an existing one untouched.
    pub fn ensure_valve(&mut self, valve_id: &str) -> &ValveStatus {
        self.valves
            .entry(valve_id.to_string())
            .or_insert_with(|| ValveStatus::new(valve_id))
    }

    #[must_use]
    pub fn valve(&self, valve_id: &str) -> Option<&ValveStatus> {
        self.valves.get(valve_id)
    }

    /// Actuator state of the valve, `CLOSE` when unknown.
    #[must_use]
    pub fn valve_state(&self, valve_id: &str) -> ValveState {
        self.valves
            .get(valve_id)
            .map_or(ValveState::Close, |status| status.state)
    }

    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            sensors: self.sensors.values().cloned().collect(),
            valves: self.valves.values().cloned().collect(),
        }
    }
}
