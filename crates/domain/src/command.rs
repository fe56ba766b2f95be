//! Commands sent to valves and their pending acknowledgement records.

use serde::{Deserialize, Serialize};

use crate::id::CommandId;
use crate::time::EpochMillis;
use crate::valve::ValveState;

/// Open duration used when nothing more specific is configured.
pub const FALLBACK_OPEN_DURATION_SECS: u64 = 600;

/// What a command asks the valve to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValveAction {
    Open,
    Close,
}

impl From<ValveState> for ValveAction {
    fn from(state: ValveState) -> Self {
        match state {
            ValveState::Open => Self::Open,
            ValveState::Close => Self::Close,
        }
    }
}

impl std::fmt::Display for ValveAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => f.write_str("OPEN"),
            Self::Close => f.write_str("CLOSE"),
        }
    }
}

/// Who asked for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandSource {
    ThresholdAuto,
    PolicyAuto,
    ManualOverride,
    ManualOpen,
    ManualClose,
    AutoClose,
}

/// Downlink payload published to `farm/valves/{valveId}/downlink`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValveCommand {
    pub command_id: CommandId,
    pub valve_id: String,
    pub action: ValveAction,
    pub duration_sec: Option<u64>,
    pub requested_at: EpochMillis,
    pub source: CommandSource,
}

impl ValveCommand {
    /// A command with a fresh correlation id.
    #[must_use]
    pub fn new(
        valve_id: impl Into<String>,
        action: ValveAction,
        duration_sec: Option<u64>,
        source: CommandSource,
        requested_at: EpochMillis,
    ) -> Self {
        Self {
            command_id: CommandId::new(),
            valve_id: valve_id.into(),
            action,
            duration_sec,
            requested_at,
            source,
        }
    }
}

/// A command awaiting its status acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub command_id: CommandId,
    pub valve_id: String,
    pub action: ValveAction,
    pub requested_at: EpochMillis,
}

impl From<&ValveCommand> for PendingCommand {
    fn from(command: &ValveCommand) -> Self {
        Self {
            command_id: command.command_id,
            valve_id: command.valve_id.clone(),
            action: command.action,
            requested_at: command.requested_at,
        }
    }
}

/// Resolve the open duration of a manual open.
///
/// First positive value wins: `explicit`, then `manual`, then `default`,
/// then [`FALLBACK_OPEN_DURATION_SECS`].
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn resolve_open_duration(explicit: Option<f64>, manual: Option<u64>, default: Option<u64>) -> u64 {
    explicit
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(|secs| (secs.round() as u64).max(1))
        .or(manual.filter(|secs| *secs > 0))
        .or(default.filter(|secs| *secs > 0))
        .unwrap_or(FALLBACK_OPEN_DURATION_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_prefer_explicit_positive_duration() {
        assert_eq!(resolve_open_duration(Some(30.0), Some(120), Some(300)), 30);
    }

    #[test]
    fn should_use_manual_duration_when_explicit_not_positive() {
        assert_eq!(resolve_open_duration(Some(0.0), Some(120), Some(300)), 120);
        assert_eq!(resolve_open_duration(Some(-4.0), Some(120), Some(300)), 120);
        assert_eq!(resolve_open_duration(Some(f64::NAN), Some(120), Some(300)), 120);
        assert_eq!(resolve_open_duration(None, Some(120), Some(300)), 120);
    }

    #[test]
    fn should_use_strategy_default_when_no_manual_duration() {
        assert_eq!(resolve_open_duration(None, None, Some(300)), 300);
    }

    #[test]
    fn should_use_fallback_when_nothing_configured() {
        assert_eq!(resolve_open_duration(None, None, None), FALLBACK_OPEN_DURATION_SECS);
        assert_eq!(resolve_open_duration(None, Some(0), Some(0)), 600);
    }

    #[test]
    fn should_serialize_downlink_payload_in_camel_case() {
        let command = ValveCommand::new("V1", ValveAction::Open, Some(600), CommandSource::ManualOpen, 1_000);
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["valveId"], "V1");
        assert_eq!(json["action"], "OPEN");
        assert_eq!(json["durationSec"], 600);
        assert_eq!(json["requestedAt"], 1_000);
        assert_eq!(json["source"], "manual_open");
        assert_eq!(json["commandId"], command.command_id.to_string());
    }

    #[test]
    fn should_serialize_missing_duration_as_null() {
        let command = ValveCommand::new("V1", ValveAction::Close, None, CommandSource::AutoClose, 1);
        let json = serde_json::to_value(&command).unwrap();
        assert!(json["durationSec"].is_null());
        assert_eq!(json["source"], "auto_close");
    }

    #[test]
    fn should_generate_unique_command_ids() {
        let a = ValveCommand::new("V1", ValveAction::Open, None, CommandSource::ManualOpen, 1);
        let b = ValveCommand::new("V1", ValveAction::Open, None, CommandSource::ManualOpen, 1);
        assert_ne!(a.command_id, b.command_id);
    }

    #[test]
    fn should_map_valve_state_to_action() {
        assert_eq!(ValveAction::from(ValveState::Open), ValveAction::Open);
        assert_eq!(ValveAction::from(ValveState::Close), ValveAction::Close);
    }
}
