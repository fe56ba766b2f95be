//! Automation decision engine: reacts to sensor readings by opening or
//! closing valves.
//!
//! Deciding is pure ([`plan`]); acting on the decisions
//! ([`on_sensor_reading`]) goes through the [`CommandDispatcher`]. Failures
//! on this path are logged and swallowed: a missed automatic actuation is
//! retried naturally by the next reading.

use irrihub_domain::command::{CommandSource, ValveAction, ValveCommand};
use irrihub_domain::sensor::SensorReading;
use irrihub_domain::strategy::AutoMethod;
use irrihub_domain::time::EpochMillis;
use irrihub_domain::valve::{ValveState, ValveStatusPatch};

use crate::dispatcher::CommandDispatcher;
use crate::ports::{Broadcaster, Transport};
use crate::state::ControlState;

/// One automatic actuation to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomationDecision {
    Open {
        valve_id: String,
        duration_sec: u64,
        source: CommandSource,
    },
    Close {
        valve_id: String,
        source: CommandSource,
    },
}

/// Decide what the automation should do with `reading`.
#[must_use]
pub fn plan(state: &ControlState, reading: &SensorReading, now: EpochMillis) -> Vec<AutomationDecision> {
    if !state.strategy.is_auto() {
        return Vec::new();
    }
    let Some(humidity) = reading.humidity() else {
        return Vec::new();
    };
    match state.strategy.auto_method {
        AutoMethod::Policy => plan_policy(state, &reading.device_id, humidity)
            .into_iter()
            .collect(),
        AutoMethod::Threshold => plan_threshold(state, &reading.device_id, humidity, now),
    }
}

/// Only the first eligible policy of the sensor is evaluated: when its
/// threshold is not crossed, later policies for the same sensor never fire.
fn plan_policy(state: &ControlState, sensor_id: &str, humidity: f64) -> Option<AutomationDecision> {
    let policy = state.policies.iter().find(|policy| {
        policy.applies_to(sensor_id)
            && !policy.valve_id.is_empty()
            && !state.manual_override.is_blocking(&policy.valve_id)
            && policy.humidity_threshold.is_finite()
    })?;
    if humidity < policy.humidity_threshold {
        Some(AutomationDecision::Open {
            valve_id: policy.valve_id.clone(),
            duration_sec: policy.effective_duration(state.strategy.open_duration_sec),
            source: CommandSource::PolicyAuto,
        })
    } else {
        None
    }
}

fn plan_threshold(
    state: &ControlState,
    sensor_id: &str,
    humidity: f64,
    now: EpochMillis,
) -> Vec<AutomationDecision> {
    let strategy = &state.strategy;
    let Some(valve_id) = state.devices.valve_for_sensor(sensor_id) else {
        return Vec::new();
    };
    if state.manual_override.is_blocking(valve_id) {
        return Vec::new();
    }

    let status = state.store.valve(valve_id);
    let valve_state = status.map_or(ValveState::Close, |status| status.state);
    let last_auto_at = status.and_then(|status| status.last_auto_at).unwrap_or(0);
    let cooling_down = now - last_auto_at < strategy.cooldown_ms();

    let mut decisions = Vec::new();
    if humidity <= strategy.humidity_low_pct && valve_state != ValveState::Open && !cooling_down {
        decisions.push(AutomationDecision::Open {
            valve_id: valve_id.to_string(),
            duration_sec: strategy.open_duration_sec,
            source: CommandSource::ThresholdAuto,
        });
    }
    if humidity >= strategy.humidity_high_pct && valve_state == ValveState::Open {
        decisions.push(AutomationDecision::Close {
            valve_id: valve_id.to_string(),
            source: CommandSource::ThresholdAuto,
        });
    }
    decisions
}

/// Run the automation for one accepted reading and return the commands that
/// were sent.
///
/// `lastAutoAt` is recorded before an automatic open is dispatched, so a
/// failed dispatch still starts the cooldown.
pub async fn on_sensor_reading<T, B>(
    dispatcher: &CommandDispatcher<T, B>,
    state: &mut ControlState,
    reading: &SensorReading,
    now: EpochMillis,
) -> Vec<ValveCommand>
where
    T: Transport,
    B: Broadcaster,
{
    let mut sent = Vec::new();
    for decision in plan(state, reading, now) {
        let result = match &decision {
            AutomationDecision::Open {
                valve_id,
                duration_sec,
                source,
            } => {
                state
                    .store
                    .upsert_valve(valve_id, ValveStatusPatch::auto_actuated(now));
                dispatcher
                    .dispatch(state, valve_id, ValveAction::Open, Some(*duration_sec), *source, now)
                    .await
            }
            AutomationDecision::Close { valve_id, source } => {
                dispatcher
                    .dispatch(state, valve_id, ValveAction::Close, None, *source, now)
                    .await
            }
        };
        match result {
            Ok(command) => sent.push(command),
            Err(err) => {
                tracing::warn!(error = %err, ?decision, sensor_id = %reading.device_id, "automatic actuation failed");
            }
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use irrihub_domain::device::{DeviceRef, DeviceRegistry};
    use irrihub_domain::manual_override::OverrideRequest;
    use irrihub_domain::policy::Policy;
    use irrihub_domain::strategy::{Mode, Strategy};
    use tokio::sync::mpsc;

    use super::*;
    use crate::controller::ControlMessage;
    use crate::state::Configuration;
    use crate::testing::{RecordingBroadcaster, RecordingTransport, control_state};

    const MINUTE: i64 = 60_000;

    fn config(method: AutoMethod) -> Configuration {
        Configuration {
            strategy: Strategy {
                auto_method: method,
                ..Strategy::default()
            },
            devices: DeviceRegistry {
                sensors: vec![DeviceRef::new("S1", "Z1")],
                valves: vec![DeviceRef::new("V1", "Z1")],
            },
            ..Configuration::default()
        }
    }

    fn policy(id: &str, valve_id: &str, threshold: f64) -> Policy {
        Policy {
            id: id.to_string(),
            sensor_id: "S1".to_string(),
            valve_id: valve_id.to_string(),
            humidity_threshold: threshold,
            duration_seconds: 0.0,
            active: true,
        }
    }

    fn set_state(state: &mut ControlState, valve_id: &str, valve_state: ValveState) {
        state.store.upsert_valve(
            valve_id,
            ValveStatusPatch {
                state: Some(valve_state),
                ..ValveStatusPatch::default()
            },
        );
    }

    struct Harness {
        dispatcher: CommandDispatcher<Arc<RecordingTransport>, Arc<RecordingBroadcaster>>,
        transport: Arc<RecordingTransport>,
        state: ControlState,
        _tx: mpsc::Sender<ControlMessage>,
        _rx: mpsc::Receiver<ControlMessage>,
    }

    fn harness(config: Configuration) -> Harness {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = CommandDispatcher::new(
            Arc::clone(&transport),
            Arc::new(RecordingBroadcaster::default()),
        );
        let (state, tx, rx) = control_state(config);
        Harness {
            dispatcher,
            transport,
            state,
            _tx: tx,
            _rx: rx,
        }
    }

    impl Harness {
        async fn read(&mut self, humidity: f64, now: EpochMillis) -> Vec<ValveCommand> {
            let reading = SensorReading::new("S1", humidity, now);
            on_sensor_reading(&self.dispatcher, &mut self.state, &reading, now).await
        }
    }

    #[tokio::test]
    async fn should_never_dispatch_in_manual_mode() {
        let mut config = config(AutoMethod::Threshold);
        config.strategy.mode = Mode::Manual;
        let mut h = harness(config);

        assert!(h.read(10.0, 1_000_000).await.is_empty());
        assert!(h.read(90.0, 2_000_000).await.is_empty());
        assert!(h.transport.topics().is_empty());
    }

    #[tokio::test]
    async fn should_open_closed_valve_below_low_threshold() {
        let mut h = harness(config(AutoMethod::Threshold));
        let now = 100 * MINUTE;

        let sent = h.read(30.0, now).await;

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].action, ValveAction::Open);
        assert_eq!(sent[0].duration_sec, Some(600));
        assert_eq!(sent[0].source, CommandSource::ThresholdAuto);
        assert_eq!(h.state.store.valve("V1").unwrap().last_auto_at, Some(now));
    }

    #[tokio::test]
    async fn should_close_open_valve_above_high_threshold() {
        let mut h = harness(config(AutoMethod::Threshold));
        set_state(&mut h.state, "V1", ValveState::Open);

        let sent = h.read(50.0, 100 * MINUTE).await;

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].action, ValveAction::Close);
        assert_eq!(sent[0].source, CommandSource::ThresholdAuto);
    }

    #[tokio::test]
    async fn should_do_nothing_between_thresholds() {
        let mut h = harness(config(AutoMethod::Threshold));
        assert!(h.read(40.0, 100 * MINUTE).await.is_empty());
        set_state(&mut h.state, "V1", ValveState::Open);
        assert!(h.read(40.0, 100 * MINUTE).await.is_empty());
    }

    #[tokio::test]
    async fn should_not_reopen_already_open_valve() {
        let mut h = harness(config(AutoMethod::Threshold));
        set_state(&mut h.state, "V1", ValveState::Open);
        assert!(h.read(10.0, 100 * MINUTE).await.is_empty());
    }

    #[tokio::test]
    async fn should_block_open_until_cooldown_elapsed() {
        let mut h = harness(config(AutoMethod::Threshold));
        let start = 100 * MINUTE;
        assert_eq!(h.read(30.0, start).await.len(), 1);
        set_state(&mut h.state, "V1", ValveState::Close);

        let cooldown = 20 * MINUTE;
        assert!(h.read(30.0, start + cooldown - 1).await.is_empty());
        let sent = h.read(30.0, start + cooldown).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].action, ValveAction::Open);
    }

    #[tokio::test]
    async fn should_close_during_cooldown() {
        let mut h = harness(config(AutoMethod::Threshold));
        let start = 100 * MINUTE;
        h.read(30.0, start).await;
        set_state(&mut h.state, "V1", ValveState::Open);

        let sent = h.read(50.0, start + MINUTE).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].action, ValveAction::Close);
    }

    #[tokio::test]
    async fn should_use_default_zone_for_unknown_sensor() {
        let mut h = harness(config(AutoMethod::Threshold));
        let reading = SensorReading::new("S-unregistered", 10.0, 100 * MINUTE);
        let decisions = plan(&h.state, &reading, 100 * MINUTE);
        assert_eq!(
            decisions,
            vec![AutomationDecision::Open {
                valve_id: "V1".to_string(),
                duration_sec: 600,
                source: CommandSource::ThresholdAuto,
            }]
        );

        h.state.devices.valves[0].zone = Some("Z2".to_string());
        assert!(plan(&h.state, &reading, 100 * MINUTE).is_empty());
    }

    #[tokio::test]
    async fn should_ignore_non_finite_humidity() {
        let mut h = harness(config(AutoMethod::Threshold));
        assert!(h.read(f64::NAN, 100 * MINUTE).await.is_empty());
    }

    #[tokio::test]
    async fn should_skip_override_blocked_valve() {
        let mut h = harness(config(AutoMethod::Threshold));
        h.state.manual_override = h
            .state
            .manual_override
            .apply(&OverrideRequest::pin("V1", ValveState::Close, None), 1);

        assert!(h.read(10.0, 100 * MINUTE).await.is_empty());
    }

    #[tokio::test]
    async fn should_evaluate_only_first_matching_policy() {
        let mut config = config(AutoMethod::Policy);
        config.policies = vec![policy("A", "VA", 40.0), policy("B", "VB", 60.0)];
        let mut h = harness(config);

        assert!(h.read(50.0, MINUTE).await.is_empty());

        let sent = h.read(30.0, MINUTE).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].valve_id, "VA");
        assert_eq!(sent[0].source, CommandSource::PolicyAuto);
        assert!(h.transport.commands().iter().all(|c| c.valve_id != "VB"));
    }

    #[tokio::test]
    async fn should_skip_inactive_and_blocked_policies() {
        let mut config = config(AutoMethod::Policy);
        let mut inactive = policy("A", "VA", 90.0);
        inactive.active = false;
        config.policies = vec![inactive, policy("B", "VB", 90.0), policy("C", "VC", 90.0)];
        let mut h = harness(config);
        h.state.manual_override = h
            .state
            .manual_override
            .apply(&OverrideRequest::pin("VB", ValveState::Close, None), 1);

        let sent = h.read(50.0, MINUTE).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].valve_id, "VC");
    }

    #[tokio::test]
    async fn should_use_policy_duration_or_strategy_default() {
        let mut config = config(AutoMethod::Policy);
        let mut timed = policy("A", "VA", 40.0);
        timed.duration_seconds = 120.0;
        config.policies = vec![timed];
        config.strategy.open_duration_sec = 300;
        let mut h = harness(config);

        assert_eq!(h.read(30.0, MINUTE).await[0].duration_sec, Some(120));

        h.state.policies[0].duration_seconds = -1.0;
        assert_eq!(h.read(30.0, MINUTE).await[0].duration_sec, Some(300));
    }

    #[tokio::test]
    async fn should_record_last_auto_at_even_when_dispatch_fails() {
        let mut h = harness(config(AutoMethod::Threshold));
        h.transport.set_connected(false);
        let now = 100 * MINUTE;

        assert!(h.read(30.0, now).await.is_empty());
        assert_eq!(h.state.store.valve("V1").unwrap().last_auto_at, Some(now));
    }
}
