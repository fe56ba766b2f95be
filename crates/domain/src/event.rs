//! Broadcast events fanned out to live listeners.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::time::EpochMillis;

/// Kind of a broadcast event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// First message sent to a new listener, carrying the current overview.
    Hello,
    Sensor,
    Valve,
    ValveCommand,
    Override,
    Strategy,
    Policies,
    /// Transport connectivity changed.
    BackendStatus,
}

impl EventKind {
    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hello => "hello",
            Self::Sensor => "sensor",
            Self::Valve => "valve",
            Self::ValveCommand => "valve_command",
            Self::Override => "override",
            Self::Strategy => "strategy",
            Self::Policies => "policies",
            Self::BackendStatus => "backend_status",
        }
    }
}

/// An event as delivered to listeners: `{kind, ts, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub kind: EventKind,
    pub ts: EpochMillis,
    pub data: Value,
}

impl BroadcastEvent {
    /// Build an event from any serializable payload.
    ///
    /// A payload that fails to serialize is sent as `null`; listeners are
    /// best-effort and never block the producer.
    pub fn new(kind: EventKind, ts: EpochMillis, data: impl Serialize) -> Self {
        Self {
            kind,
            ts,
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        }
    }
}
