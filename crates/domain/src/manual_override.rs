//! Manual override registry: suppresses automatic actuation per valve.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::time::EpochMillis;
use crate::valve::ValveState;

/// Override entry of a single valve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValveOverride {
    pub enabled: bool,
    /// State the operator asked for; `None` when no state is pinned.
    #[serde(default)]
    pub desired_state: Option<ValveState>,
    #[serde(default)]
    pub updated_at: EpochMillis,
}

/// Global override flag plus per-valve entries.
///
/// A valve is blocked from automation only when both the global flag and its
/// own entry are enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualOverride {
    pub enabled: bool,
    pub valves: BTreeMap<String, ValveOverride>,
}

/// A request to change the override registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideRequest {
    pub enabled: Option<bool>,
    pub valve_id: Option<String>,
    /// `None` keeps the previous desired state, `Some(None)` clears it.
    pub desired_state: Option<Option<ValveState>>,
    /// Explicit open duration in seconds, used when the desired state is
    /// `OPEN`.
    pub duration_sec: Option<f64>,
}

impl OverrideRequest {
    /// Request changing only the global flag.
    #[must_use]
    pub fn global(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    /// Request pinning `valve_id` to `state` with the override enabled.
    #[must_use]
    pub fn pin(valve_id: impl Into<String>, state: ValveState, duration_sec: Option<f64>) -> Self {
        Self {
            enabled: Some(true),
            valve_id: Some(valve_id.into()),
            desired_state: Some(Some(state)),
            duration_sec,
        }
    }

    /// The state this request asks the valve to be driven to, if any.
    #[must_use]
    pub fn requested_state(&self) -> Option<ValveState> {
        self.valve_id.as_ref()?;
        self.desired_state.flatten()
    }
}

impl ManualOverride {
    /// Whether automation must leave `valve_id` alone.
    #[must_use]
    pub fn is_blocking(&self, valve_id: &str) -> bool {
        self.enabled
            && self
                .valves
                .get(valve_id)
                .is_some_and(|entry| entry.enabled)
    }

    /// Registry resulting from `request`.
    ///
    /// - `enabled` without a valve sets the global flag.
    /// - `enabled = true` with a valve also turns the global flag on.
    /// - a valve without `enabled` gets an enabled entry.
    #[must_use]
    pub fn apply(&self, request: &OverrideRequest, now: EpochMillis) -> Self {
        let enabled = match (request.enabled, request.valve_id.as_ref()) {
            (Some(flag), None) => flag,
            (Some(true), Some(_)) => true,
            _ => self.enabled,
        };
        let mut valves = self.valves.clone();
        if let Some(valve_id) = &request.valve_id {
            let previous = valves
                .get(valve_id)
                .and_then(|entry| entry.desired_state);
            valves.insert(
                valve_id.clone(),
                ValveOverride {
                    enabled: request.enabled.unwrap_or(true),
                    desired_state: request.desired_state.unwrap_or(previous),
                    updated_at: now,
                },
            );
        }
        Self { enabled, valves }
    }
}
