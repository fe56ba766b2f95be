//! Inbound message parsing: turns a raw transport message into a sensor
//! reading or a valve status report.

use serde_json::{Map, Value};

use irrihub_domain::device::DeviceRegistry;
use irrihub_domain::error::MalformedMessage;
use irrihub_domain::sensor::SensorReading;
use irrihub_domain::time::EpochMillis;
use irrihub_domain::topic::{self, TopicKind};
use irrihub_domain::valve::{ValveState, ValveStatusPatch};

/// A valve status report as received.
#[derive(Debug, Clone, PartialEq)]
pub struct ValveReport {
    pub valve_id: String,
    pub state: Option<ValveState>,
    pub command_id: Option<String>,
    pub responded_at: Option<EpochMillis>,
    pub ts: EpochMillis,
    /// Every other field of the payload.
    pub extra: Map<String, Value>,
}

impl ValveReport {
    /// Patch applying this report, with the latency the tracker computed.
    #[must_use]
    pub fn into_patch(self, latency_ms: Option<i64>) -> ValveStatusPatch {
        ValveStatusPatch {
            state: self.state,
            last_auto_at: None,
            latency_ms: Some(latency_ms),
            command_id: self.command_id,
            responded_at: self.responded_at,
            ts: Some(self.ts),
            extra: self.extra,
        }
    }

    /// History record payload: the report as received, with its resolved
    /// timestamp and latency.
    #[must_use]
    pub fn to_record(&self, latency_ms: Option<i64>) -> Value {
        let mut record = self.extra.clone();
        record.insert("valveId".to_string(), Value::from(self.valve_id.clone()));
        if let Some(state) = self.state {
            record.insert("state".to_string(), Value::from(state.to_string()));
        }
        if let Some(command_id) = &self.command_id {
            record.insert("commandId".to_string(), Value::from(command_id.clone()));
        }
        if let Some(responded_at) = self.responded_at {
            record.insert("respondedAt".to_string(), Value::from(responded_at));
        }
        record.insert("ts".to_string(), Value::from(self.ts));
        record.insert("latencyMs".to_string(), latency_ms.map_or(Value::Null, Value::from));
        Value::Object(record)
    }
}

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Sensor(SensorReading),
    ValveStatus(ValveReport),
}

/// Parse a message received on `topic`.
///
/// A missing or non-numeric `ts` is replaced with `now`. The sensor's zone
/// is resolved from `devices`.
///
/// # Errors
///
/// Returns [`MalformedMessage`] for an unknown topic, a payload that is not
/// a JSON object, or an empty device identifier.
#[allow(clippy::cast_possible_truncation)]
pub fn parse(
    topic_name: &str,
    payload: &[u8],
    devices: &DeviceRegistry,
    now: EpochMillis,
) -> Result<InboundMessage, MalformedMessage> {
    let kind = topic::classify(topic_name)
        .ok_or_else(|| MalformedMessage::UnknownTopic(topic_name.to_string()))?;
    let mut fields = match serde_json::from_slice::<Value>(payload) {
        Ok(Value::Object(fields)) => fields,
        Ok(other) => {
            return Err(MalformedMessage::InvalidJson(format!(
                "expected an object, got {other}"
            )));
        }
        Err(err) => return Err(MalformedMessage::InvalidJson(err.to_string())),
    };
    let ts = fields
        .remove("ts")
        .and_then(|value| as_number(&value))
        .map_or(now, |ts| ts as EpochMillis);

    match kind {
        TopicKind::SensorUplink => {
            let device_id = take_identifier(&mut fields, "deviceId")?;
            let humidity_pct = fields.remove("humidityPct").and_then(|value| as_number(&value));
            fields.remove("zone");
            Ok(InboundMessage::Sensor(SensorReading {
                zone: devices.zone_for_sensor(&device_id).to_string(),
                device_id,
                humidity_pct,
                ts,
                extra: fields,
            }))
        }
        TopicKind::ValveStatus => {
            let valve_id = take_identifier(&mut fields, "valveId")?;
            let state = fields
                .remove("state")
                .and_then(|value| serde_json::from_value(value).ok());
            let command_id = fields.remove("commandId").and_then(|value| as_text(&value));
            let responded_at = fields
                .remove("respondedAt")
                .and_then(|value| as_number(&value))
                .map(|at| at as EpochMillis);
            for reserved in ["id", "latencyMs", "lastAutoAt"] {
                fields.remove(reserved);
            }
            Ok(InboundMessage::ValveStatus(ValveReport {
                valve_id,
                state,
                command_id,
                responded_at,
                ts,
                extra: fields,
            }))
        }
    }
}

fn take_identifier(fields: &mut Map<String, Value>, key: &str) -> Result<String, MalformedMessage> {
    fields
        .remove(key)
        .and_then(|value| as_text(&value))
        .filter(|id| !id.is_empty())
        .ok_or(MalformedMessage::MissingIdentifier)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}
