//! Policy: an ordered sensor → valve irrigation rule.
//!
//! Policies are only ever replaced as a whole collection. Client input goes
//! through [`normalize`], which fills defaults and silently drops entries
//! that cannot be evaluated.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigurationRejected;
use crate::time::EpochMillis;

/// One irrigation rule: open `valve_id` when `sensor_id` reads below
/// `humidity_threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub sensor_id: String,
    pub valve_id: String,
    pub humidity_threshold: f64,
    /// Open duration in seconds; zero means "use the strategy default".
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Policy {
    /// Whether this policy is active and reacts to `sensor_id`.
    #[must_use]
    pub fn applies_to(&self, sensor_id: &str) -> bool {
        self.active && self.sensor_id == sensor_id
    }

    /// Open duration to use, falling back to `default` when the policy does
    /// not carry a positive one.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn effective_duration(&self, default: u64) -> u64 {
        if self.duration_seconds.is_finite() && self.duration_seconds > 0.0 {
            (self.duration_seconds.round() as u64).max(1)
        } else {
            default
        }
    }
}

/// Normalize a client-supplied policy collection.
///
/// Accepts either `{"policies": [...]}` or a bare array. Non-object entries
/// are skipped; a missing id becomes `"{now}-{index}"`; a missing `active`
/// becomes `true`; entries with an empty sensor or valve id, or without a
/// finite threshold, are discarded.
///
/// # Errors
///
/// Returns [`ConfigurationRejected::PoliciesNotArray`] when no array is
/// found.
pub fn normalize(body: &Value, now: EpochMillis) -> Result<Vec<Policy>, ConfigurationRejected> {
    let raw = match body {
        Value::Object(map) => map.get("policies").unwrap_or(body),
        _ => body,
    };
    let Value::Array(entries) = raw else {
        return Err(ConfigurationRejected::PoliciesNotArray);
    };

    let policies = entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let entry = entry.as_object()?;
            let id = entry
                .get("id")
                .and_then(as_text)
                .unwrap_or_else(|| format!("{now}-{idx}"));
            let sensor_id = entry.get("sensorId").and_then(as_text).unwrap_or_default();
            let valve_id = entry.get("valveId").and_then(as_text).unwrap_or_default();
            let humidity_threshold = entry
                .get("humidityThreshold")
                .and_then(as_number)
                .filter(|value| value.is_finite())?;
            if sensor_id.is_empty() || valve_id.is_empty() {
                return None;
            }
            let duration_seconds = entry
                .get("durationSeconds")
                .and_then(as_number)
                .filter(|value| value.is_finite())
                .unwrap_or(0.0);
            let active = entry.get("active").and_then(Value::as_bool).unwrap_or(true);
            Some(Policy {
                id,
                sensor_id,
                valve_id,
                humidity_threshold,
                duration_seconds,
                active,
            })
        })
        .collect();
    Ok(policies)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
