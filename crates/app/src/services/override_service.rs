//! Override service: manual override updates and the manual valve toggle.

use irrihub_domain::command::{CommandSource, ValveAction, resolve_open_duration};
use irrihub_domain::error::IrrigationError;
use irrihub_domain::event::{BroadcastEvent, EventKind};
use irrihub_domain::manual_override::{ManualOverride, OverrideRequest};
use irrihub_domain::time::EpochMillis;
use irrihub_domain::valve::{ValveState, ValveStatusPatch};

use crate::dispatcher::CommandDispatcher;
use crate::ports::{Broadcaster, ConfigKey, ConfigStore, Transport};
use crate::state::{ControlState, to_document};

/// Apply `request` to the override registry, then drive the valve to its
/// requested state, if any, with source `manual_override`.
///
/// An `OPEN` lasts the first positive of: the request's `duration_sec`, the
/// strategy's manual open duration, its default open duration, 600 seconds.
///
/// # Errors
///
/// Returns [`IrrigationError::TransportUnavailable`] before changing
/// anything when a valve command is needed but the transport is down, a
/// storage error if the registry cannot be persisted, or the publish error
/// (the registry change is kept in that case).
#[tracing::instrument(skip(state, dispatcher, store))]
pub async fn set_override<T, B, S>(
    state: &mut ControlState,
    dispatcher: &CommandDispatcher<T, B>,
    store: &S,
    request: OverrideRequest,
    now: EpochMillis,
) -> Result<ManualOverride, IrrigationError>
where
    T: Transport,
    B: Broadcaster,
    S: ConfigStore,
{
    let target = request.requested_state();
    if target.is_some() && !dispatcher.is_connected() {
        return Err(IrrigationError::TransportUnavailable);
    }

    let next = state.manual_override.apply(&request, now);
    store.save(ConfigKey::Override, to_document(&next)).await?;
    tracing::info!(enabled = next.enabled, valve_id = ?request.valve_id, "manual override updated");
    state.manual_override = next;
    dispatcher.broadcaster().broadcast(BroadcastEvent::new(
        EventKind::Override,
        now,
        &state.manual_override,
    ));

    if let (Some(valve_id), Some(target)) = (request.valve_id.as_deref(), target) {
        let duration = match target {
            ValveState::Open => Some(resolve_open_duration(
                request.duration_sec,
                state.strategy.manual_open_duration_sec,
                Some(state.strategy.open_duration_sec),
            )),
            ValveState::Close => None,
        };
        dispatcher
            .dispatch(
                state,
                valve_id,
                ValveAction::from(target),
                duration,
                CommandSource::ManualOverride,
                now,
            )
            .await?;
        // desired state until the device reports back
        state.store.upsert_valve(
            valve_id,
            ValveStatusPatch {
                state: Some(target),
                ..ValveStatusPatch::default()
            },
        );
    }

    Ok(state.manual_override.clone())
}

/// Flip the valve's last known state through a manual override.
///
/// # Errors
///
/// Same as [`set_override`].
pub async fn toggle_valve_manual<T, B, S>(
    state: &mut ControlState,
    dispatcher: &CommandDispatcher<T, B>,
    store: &S,
    valve_id: &str,
    duration_sec: Option<f64>,
    now: EpochMillis,
) -> Result<ManualOverride, IrrigationError>
where
    T: Transport,
    B: Broadcaster,
    S: ConfigStore,
{
    let target = state.store.valve_state(valve_id).toggled();
    let request = OverrideRequest::pin(valve_id, target, duration_sec);
    set_override(state, dispatcher, store, request, now).await
}
