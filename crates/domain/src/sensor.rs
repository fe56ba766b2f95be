//! Sensor reading: the latest humidity uplink of a soil sensor.

use serde::{Deserialize, Serialize};

use crate::time::EpochMillis;

/// Immutable snapshot of one sensor uplink.
///
/// Fields the device sends beyond the ones the core reasons about are kept
/// in `extra` so the stored snapshot and the history record stay faithful
/// to what the device reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub device_id: String,
    /// Zone resolved from the device registry at ingestion time.
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub humidity_pct: Option<f64>,
    pub ts: EpochMillis,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SensorReading {
    #[must_use]
    pub fn new(device_id: impl Into<String>, humidity_pct: f64, ts: EpochMillis) -> Self {
        Self {
            device_id: device_id.into(),
            zone: String::new(),
            humidity_pct: Some(humidity_pct),
            ts,
            extra: serde_json::Map::new(),
        }
    }

    /// Humidity, when the device reported a finite number.
    #[must_use]
    pub fn humidity(&self) -> Option<f64> {
        self.humidity_pct.filter(|value| value.is_finite())
    }
}
