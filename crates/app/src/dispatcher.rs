//! Command dispatcher: the single path by which a valve command leaves the
//! core.

use std::time::Duration;

use irrihub_domain::command::{CommandSource, PendingCommand, ValveAction, ValveCommand};
use irrihub_domain::error::IrrigationError;
use irrihub_domain::event::{BroadcastEvent, EventKind};
use irrihub_domain::time::EpochMillis;
use irrihub_domain::topic;

use crate::ports::{Broadcaster, Transport};
use crate::state::ControlState;

/// Publishes valve commands, registers them with the tracker and announces
/// them to live listeners.
pub struct CommandDispatcher<T, B> {
    transport: T,
    broadcaster: B,
}

impl<T, B> CommandDispatcher<T, B>
where
    T: Transport,
    B: Broadcaster,
{
    pub fn new(transport: T, broadcaster: B) -> Self {
        Self {
            transport,
            broadcaster,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Live fan-out shared with the rest of the core.
    pub fn broadcaster(&self) -> &B {
        &self.broadcaster
    }

    /// Send `action` to `valve_id`.
    ///
    /// An `OPEN` with a positive `duration_sec` also (re)schedules the
    /// valve's auto-close; any other `CLOSE` than the auto-close itself
    /// cancels a pending one.
    ///
    /// # Errors
    ///
    /// Returns [`IrrigationError::TransportUnavailable`] without touching
    /// any state when the transport is disconnected, or the publish error.
    /// A failed publish leaves the command registered.
    #[tracing::instrument(skip(self, state))]
    pub async fn dispatch(
        &self,
        state: &mut ControlState,
        valve_id: &str,
        action: ValveAction,
        duration_sec: Option<u64>,
        source: CommandSource,
        now: EpochMillis,
    ) -> Result<ValveCommand, IrrigationError> {
        if !self.transport.is_connected() {
            return Err(IrrigationError::TransportUnavailable);
        }

        state.store.ensure_valve(valve_id);
        let command = ValveCommand::new(valve_id, action, duration_sec, source, now);
        state.tracker.register(PendingCommand::from(&command));

        let payload = serde_json::to_vec(&command)
            .map_err(|err| IrrigationError::Publish(Box::new(err)))?;
        self.transport
            .publish(topic::valve_downlink(valve_id), payload)
            .await?;
        tracing::info!(command_id = %command.command_id, "valve command published");

        self.broadcaster
            .broadcast(BroadcastEvent::new(EventKind::ValveCommand, now, &command));

        match (action, duration_sec) {
            (ValveAction::Open, Some(secs)) if secs > 0 => {
                state
                    .tracker
                    .schedule_auto_close(valve_id, Duration::from_secs(secs));
            }
            (ValveAction::Close, _) if source != CommandSource::AutoClose => {
                if state.tracker.cancel_auto_close(valve_id) {
                    tracing::debug!(valve_id, "pending auto-close cancelled");
                }
            }
            _ => {}
        }

        Ok(command)
    }
}
