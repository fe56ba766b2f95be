//! Valve status: last known actuator state of an irrigation valve.

use serde::{Deserialize, Serialize};

use crate::time::EpochMillis;

/// Physical state of a valve actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValveState {
    Open,
    #[default]
    Close,
}

impl ValveState {
    /// The opposite state.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Open => Self::Close,
            Self::Close => Self::Open,
        }
    }
}

impl std::fmt::Display for ValveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => f.write_str("OPEN"),
            Self::Close => f.write_str("CLOSE"),
        }
    }
}

/// Merged status of one valve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValveStatus {
    pub id: String,
    #[serde(default)]
    pub state: ValveState,
    /// Last time the automation opened this valve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_auto_at: Option<EpochMillis>,
    /// Round-trip latency of the last acknowledged command.
    #[serde(default)]
    pub latency_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<EpochMillis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<EpochMillis>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ValveStatus {
    /// A valve nobody has heard from yet: closed, no history.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: ValveState::Close,
            last_auto_at: None,
            latency_ms: None,
            command_id: None,
            responded_at: None,
            ts: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Overlay `patch` on this status. Fields the patch leaves unset keep
    /// their current value.
    pub fn merge(&mut self, patch: ValveStatusPatch) {
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(ts) = patch.last_auto_at {
            self.last_auto_at = Some(ts);
        }
        if let Some(latency) = patch.latency_ms {
            self.latency_ms = latency;
        }
        if let Some(command_id) = patch.command_id {
            self.command_id = Some(command_id);
        }
        if let Some(responded_at) = patch.responded_at {
            self.responded_at = Some(responded_at);
        }
        if let Some(ts) = patch.ts {
            self.ts = Some(ts);
        }
        self.extra.extend(patch.extra);
    }
}

/// A partial valve status.
///
/// `latency_ms` is doubly optional: `None` leaves the stored latency alone,
/// `Some(None)` clears it (an acknowledgement that matched no command).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValveStatusPatch {
    pub state: Option<ValveState>,
    pub last_auto_at: Option<EpochMillis>,
    pub latency_ms: Option<Option<i64>>,
    pub command_id: Option<String>,
    pub responded_at: Option<EpochMillis>,
    pub ts: Option<EpochMillis>,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ValveStatusPatch {
    /// Patch recording an automatic actuation at `at`.
    #[must_use]
    pub fn auto_actuated(at: EpochMillis) -> Self {
        Self {
            last_auto_at: Some(at),
            ..Self::default()
        }
    }
}
