//! Device registry: static reference data mapping sensors and valves to zones.

use serde::{Deserialize, Serialize};

/// Zone assumed for a sensor the registry does not know about.
pub const DEFAULT_ZONE: &str = "Z1";

/// A registered sensor or valve and the zone it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Descriptive fields (name, location, …) kept as provided.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DeviceRef {
    #[must_use]
    pub fn new(id: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            zone: Some(zone.into()),
            extra: serde_json::Map::new(),
        }
    }
}

/// The known sensors and valves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceRegistry {
    pub sensors: Vec<DeviceRef>,
    pub valves: Vec<DeviceRef>,
}

impl DeviceRegistry {
    /// Zone of the given sensor, or [`DEFAULT_ZONE`] when the sensor is
    /// unknown or has no zone.
    #[must_use]
    pub fn zone_for_sensor(&self, sensor_id: &str) -> &str {
        self.sensors
            .iter()
            .find(|sensor| sensor.id == sensor_id)
            .and_then(|sensor| sensor.zone.as_deref())
            .unwrap_or(DEFAULT_ZONE)
    }

    /// First valve registered in `zone`.
    #[must_use]
    pub fn valve_for_zone(&self, zone: &str) -> Option<&str> {
        self.valves
            .iter()
            .find(|valve| valve.zone.as_deref() == Some(zone))
            .map(|valve| valve.id.as_str())
    }

    /// Resolve sensor → zone → valve.
    #[must_use]
    pub fn valve_for_sensor(&self, sensor_id: &str) -> Option<&str> {
        self.valve_for_zone(self.zone_for_sensor(sensor_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> DeviceRegistry {
        DeviceRegistry {
            sensors: vec![DeviceRef::new("S1", "Z1"), DeviceRef::new("S2", "Z2")],
            valves: vec![DeviceRef::new("V1", "Z1"), DeviceRef::new("V2", "Z2")],
        }
    }

    #[test]
    fn should_resolve_zone_of_known_sensor() {
        assert_eq!(registry().zone_for_sensor("S2"), "Z2");
    }

    #[test]
    fn should_default_zone_when_sensor_unknown() {
        assert_eq!(registry().zone_for_sensor("S9"), DEFAULT_ZONE);
    }

    #[test]
    fn should_resolve_valve_through_zone() {
        assert_eq!(registry().valve_for_sensor("S2"), Some("V2"));
    }

    #[test]
    fn should_return_none_when_zone_has_no_valve() {
        let mut devices = registry();
        devices.sensors.push(DeviceRef::new("S3", "Z3"));
        assert_eq!(devices.valve_for_sensor("S3"), None);
    }

    #[test]
    fn should_ignore_valve_without_zone() {
        let json = serde_json::json!({
            "sensors": [{"id": "S1", "zone": "Z1"}],
            "valves": [{"id": "V1", "name": "north field"}]
        });
        let devices: DeviceRegistry = serde_json::from_value(json).unwrap();
        assert_eq!(devices.valve_for_sensor("S1"), None);
        assert_eq!(devices.valves[0].extra["name"], "north field");
    }

    #[test]
    fn should_default_to_empty_registry_for_missing_fields() {
        let devices: DeviceRegistry = serde_json::from_str("{}").unwrap();
        assert!(devices.sensors.is_empty());
        assert!(devices.valves.is_empty());
    }
}
