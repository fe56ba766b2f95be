//! Controller: the single task owning all mutable core state.
//!
//! Inbound transport messages, API requests and auto-close timer firings are
//! all delivered as [`ControlMessage`]s on one channel and handled one at a
//! time, so no lock guards the state. Callers talk to the controller through
//! a cloneable [`ControllerHandle`].

use tokio::sync::{mpsc, oneshot};

use irrihub_domain::command::{CommandSource, ValveAction, ValveCommand};
use irrihub_domain::error::IrrigationError;
use irrihub_domain::event::{BroadcastEvent, EventKind};
use irrihub_domain::id::CommandId;
use irrihub_domain::manual_override::{ManualOverride, OverrideRequest};
use irrihub_domain::policy::Policy;
use irrihub_domain::sensor::SensorReading;
use irrihub_domain::strategy::{Mode, Strategy, StrategyPatch};
use irrihub_domain::time::EpochMillis;

use crate::automation_engine;
use crate::dispatcher::CommandDispatcher;
use crate::ingest::{self, InboundMessage, ValveReport};
use crate::ports::{
    Broadcaster, Clock, ConfigStore, HistoryCategory, HistoryLog, HistoryRecord, Transport,
};
use crate::services::{configuration_service, override_service};
use crate::state::{Configuration, ControlState, to_document};
use crate::store::DeviceSnapshot;
use crate::tracker::CommandTracker;

/// Reply channel of a request.
pub type Reply<T> = oneshot::Sender<Result<T, IrrigationError>>;

/// Everything the controller reacts to.
pub enum ControlMessage {
    /// A raw message received by the transport.
    Inbound { topic: String, payload: Vec<u8> },
    /// The transport connected or lost its connection.
    TransportStatus { connected: bool },
    /// An auto-close timer fired.
    AutoCloseDue { valve_id: String, generation: u64 },
    Overview { reply: Reply<Overview> },
    Latest { reply: Reply<DeviceSnapshot> },
    UpdateStrategy { patch: StrategyPatch, reply: Reply<Strategy> },
    SetMode { mode: Mode, reply: Reply<Strategy> },
    ReplacePolicies { body: serde_json::Value, reply: Reply<Vec<Policy>> },
    SetOverride { request: OverrideRequest, reply: Reply<ManualOverride> },
    ToggleValve {
        valve_id: String,
        duration_sec: Option<f64>,
        reply: Reply<ManualOverride>,
    },
    OpenValve {
        valve_id: String,
        duration_sec: u64,
        reply: Reply<ValveCommand>,
    },
    CloseValve { valve_id: String, reply: Reply<ValveCommand> },
}

/// Current configuration and transport connectivity.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub configuration: Configuration,
    pub transport_connected: bool,
}

/// The controller task. Build it with [`Controller::new`] and drive it with
/// [`Controller::run`].
pub struct Controller<T, B, S, H, C> {
    receiver: mpsc::Receiver<ControlMessage>,
    state: ControlState,
    dispatcher: CommandDispatcher<T, B>,
    config_store: S,
    history: H,
    clock: C,
}

impl<T, B, S, H, C> Controller<T, B, S, H, C>
where
    T: Transport,
    B: Broadcaster,
    S: ConfigStore,
    H: HistoryLog,
    C: Clock,
{
    /// Create the controller and the handle used to reach it.
    pub fn new(
        configuration: Configuration,
        transport: T,
        broadcaster: B,
        config_store: S,
        history: H,
        clock: C,
        capacity: usize,
    ) -> (Self, ControllerHandle) {
        let (sender, receiver) = mpsc::channel(capacity);
        let tracker = CommandTracker::new(sender.downgrade());
        let controller = Self {
            receiver,
            state: ControlState::new(configuration, tracker),
            dispatcher: CommandDispatcher::new(transport, broadcaster),
            config_store,
            history,
            clock,
        };
        (controller, ControllerHandle { sender })
    }

    /// Process messages until every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!("controller started");
        while let Some(message) = self.receiver.recv().await {
            self.handle(message).await;
        }
        tracing::info!("controller stopped");
    }

    #[allow(clippy::too_many_lines)]
    async fn handle(&mut self, message: ControlMessage) {
        let now = self.clock.now();
        match message {
            ControlMessage::Inbound { topic, payload } => {
                match ingest::parse(&topic, &payload, &self.state.devices, now) {
                    Ok(InboundMessage::Sensor(reading)) => self.on_sensor(reading, now).await,
                    Ok(InboundMessage::ValveStatus(report)) => self.on_valve_status(report, now).await,
                    Err(err) => tracing::debug!(%topic, error = %err, "dropping inbound message"),
                }
            }
            ControlMessage::TransportStatus { connected } => self.on_transport_status(connected, now),
            ControlMessage::AutoCloseDue {
                valve_id,
                generation,
            } => self.on_auto_close_due(&valve_id, generation, now).await,
            ControlMessage::Overview { reply } => {
                let _ = reply.send(Ok(Overview {
                    configuration: self.state.configuration(),
                    transport_connected: self.dispatcher.is_connected(),
                }));
            }
            ControlMessage::Latest { reply } => {
                let _ = reply.send(Ok(self.state.store.snapshot()));
            }
            ControlMessage::UpdateStrategy { patch, reply } => {
                let result = configuration_service::update_strategy(
                    &mut self.state,
                    &self.config_store,
                    self.dispatcher.broadcaster(),
                    patch,
                    now,
                )
                .await;
                let _ = reply.send(result);
            }
            ControlMessage::SetMode { mode, reply } => {
                let result = configuration_service::set_mode(
                    &mut self.state,
                    &self.config_store,
                    self.dispatcher.broadcaster(),
                    mode,
                    now,
                )
                .await;
                let _ = reply.send(result);
            }
            ControlMessage::ReplacePolicies { body, reply } => {
                let result = configuration_service::replace_policies(
                    &mut self.state,
                    &self.config_store,
                    self.dispatcher.broadcaster(),
                    &body,
                    now,
                )
                .await;
                let _ = reply.send(result);
            }
            ControlMessage::SetOverride { request, reply } => {
                let result = override_service::set_override(
                    &mut self.state,
                    &self.dispatcher,
                    &self.config_store,
                    request,
                    now,
                )
                .await;
                let _ = reply.send(result);
            }
            ControlMessage::ToggleValve {
                valve_id,
                duration_sec,
                reply,
            } => {
                let result = override_service::toggle_valve_manual(
                    &mut self.state,
                    &self.dispatcher,
                    &self.config_store,
                    &valve_id,
                    duration_sec,
                    now,
                )
                .await;
                let _ = reply.send(result);
            }
            ControlMessage::OpenValve {
                valve_id,
                duration_sec,
                reply,
            } => {
                let result = self
                    .dispatcher
                    .dispatch(
                        &mut self.state,
                        &valve_id,
                        ValveAction::Open,
                        Some(duration_sec),
                        CommandSource::ManualOpen,
                        now,
                    )
                    .await;
                let _ = reply.send(result);
            }
            ControlMessage::CloseValve { valve_id, reply } => {
                let result = self
                    .dispatcher
                    .dispatch(
                        &mut self.state,
                        &valve_id,
                        ValveAction::Close,
                        None,
                        CommandSource::ManualClose,
                        now,
                    )
                    .await;
                let _ = reply.send(result);
            }
        }
    }

    async fn on_sensor(&mut self, reading: SensorReading, now: EpochMillis) {
        let reading = self.state.store.upsert_sensor(reading).clone();
        self.record(
            HistoryCategory::Sensors,
            &reading.device_id,
            reading.ts,
            to_document(&reading),
        )
        .await;
        self.dispatcher
            .broadcaster()
            .broadcast(BroadcastEvent::new(EventKind::Sensor, now, &reading));
        automation_engine::on_sensor_reading(&self.dispatcher, &mut self.state, &reading, now)
            .await;
    }

    async fn on_valve_status(&mut self, report: ValveReport, now: EpochMillis) {
        let command_id = report
            .command_id
            .as_deref()
            .and_then(|id| id.parse::<CommandId>().ok());
        let latency_ms = match (command_id, report.responded_at) {
            (Some(id), Some(responded_at)) => self.state.tracker.resolve(&id, responded_at),
            (Some(id), None) => {
                self.state.tracker.discard(&id);
                None
            }
            (None, _) => None,
        };
        if latency_ms.is_none() && report.command_id.is_some() {
            tracing::debug!(
                valve_id = %report.valve_id,
                command_id = ?report.command_id,
                "acknowledgement matched no pending command"
            );
        }

        let valve_id = report.valve_id.clone();
        let ts = report.ts;
        let record = report.to_record(latency_ms);
        let status = self
            .state
            .store
            .upsert_valve(&valve_id, report.into_patch(latency_ms))
            .clone();
        self.record(HistoryCategory::Valves, &valve_id, ts, record)
            .await;
        self.dispatcher
            .broadcaster()
            .broadcast(BroadcastEvent::new(EventKind::Valve, now, &status));
    }

    fn on_transport_status(&self, connected: bool, now: EpochMillis) {
        let status = if connected {
            tracing::info!("transport connected");
            "connected"
        } else {
            tracing::warn!("transport disconnected");
            "disconnected"
        };
        self.dispatcher.broadcaster().broadcast(BroadcastEvent::new(
            EventKind::BackendStatus,
            now,
            serde_json::json!({ "mqtt": status }),
        ));
    }

    async fn on_auto_close_due(&mut self, valve_id: &str, generation: u64, now: EpochMillis) {
        if !self.state.tracker.take_due(valve_id, generation) {
            tracing::debug!(valve_id, generation, "ignoring stale auto-close");
            return;
        }
        if let Err(err) = self
            .dispatcher
            .dispatch(
                &mut self.state,
                valve_id,
                ValveAction::Close,
                None,
                CommandSource::AutoClose,
                now,
            )
            .await
        {
            tracing::warn!(valve_id, error = %err, "auto-close failed");
        }
    }

    async fn record(
        &self,
        category: HistoryCategory,
        device_id: &str,
        ts: EpochMillis,
        payload: serde_json::Value,
    ) {
        let record = HistoryRecord {
            category,
            device_id: device_id.to_string(),
            ts,
            payload,
        };
        if let Err(err) = self.history.append(record).await {
            tracing::error!(category = category.as_str(), device_id, error = %err, "unable to append history");
        }
    }
}

/// Cloneable handle sending requests to the controller.
#[derive(Clone)]
pub struct ControllerHandle {
    sender: mpsc::Sender<ControlMessage>,
}

impl ControllerHandle {
    /// Hand a raw inbound transport message to the controller.
    ///
    /// # Errors
    ///
    /// Returns [`IrrigationError::ControllerStopped`] if the controller is
    /// gone. Parsing errors are handled (and logged) by the controller.
    pub async fn ingest(&self, topic: String, payload: Vec<u8>) -> Result<(), IrrigationError> {
        self.send(ControlMessage::Inbound { topic, payload }).await
    }

    /// Report a transport connectivity change.
    ///
    /// # Errors
    ///
    /// Returns [`IrrigationError::ControllerStopped`] if the controller is gone.
    pub async fn transport_status(&self, connected: bool) -> Result<(), IrrigationError> {
        self.send(ControlMessage::TransportStatus { connected }).await
    }

    /// Current configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IrrigationError::ControllerStopped`] if the controller is gone.
    pub async fn overview(&self) -> Result<Overview, IrrigationError> {
        self.call(|reply| ControlMessage::Overview { reply }).await
    }

    /// Latest state of every device.
    ///
    /// # Errors
    ///
    /// Returns [`IrrigationError::ControllerStopped`] if the controller is gone.
    pub async fn latest(&self) -> Result<DeviceSnapshot, IrrigationError> {
        self.call(|reply| ControlMessage::Latest { reply }).await
    }

    /// # Errors
    ///
    /// See [`configuration_service::update_strategy`].
    pub async fn update_strategy(&self, patch: StrategyPatch) -> Result<Strategy, IrrigationError> {
        self.call(|reply| ControlMessage::UpdateStrategy { patch, reply })
            .await
    }

    /// # Errors
    ///
    /// See [`configuration_service::set_mode`].
    pub async fn set_mode(&self, mode: Mode) -> Result<Strategy, IrrigationError> {
        self.call(|reply| ControlMessage::SetMode { mode, reply }).await
    }

    /// # Errors
    ///
    /// See [`configuration_service::replace_policies`].
    pub async fn replace_policies(
        &self,
        body: serde_json::Value,
    ) -> Result<Vec<Policy>, IrrigationError> {
        self.call(|reply| ControlMessage::ReplacePolicies { body, reply })
            .await
    }

    /// # Errors
    ///
    /// See [`override_service::set_override`].
    pub async fn set_override(
        &self,
        request: OverrideRequest,
    ) -> Result<ManualOverride, IrrigationError> {
        self.call(|reply| ControlMessage::SetOverride { request, reply })
            .await
    }

    /// # Errors
    ///
    /// See [`override_service::toggle_valve_manual`].
    pub async fn toggle_valve(
        &self,
        valve_id: String,
        duration_sec: Option<f64>,
    ) -> Result<ManualOverride, IrrigationError> {
        self.call(|reply| ControlMessage::ToggleValve {
            valve_id,
            duration_sec,
            reply,
        })
        .await
    }

    /// Manually open a valve; a positive duration schedules its auto-close.
    ///
    /// # Errors
    ///
    /// See [`CommandDispatcher::dispatch`].
    pub async fn open_valve(
        &self,
        valve_id: String,
        duration_sec: u64,
    ) -> Result<ValveCommand, IrrigationError> {
        self.call(|reply| ControlMessage::OpenValve {
            valve_id,
            duration_sec,
            reply,
        })
        .await
    }

    /// Manually close a valve.
    ///
    /// # Errors
    ///
    /// See [`CommandDispatcher::dispatch`].
    pub async fn close_valve(&self, valve_id: String) -> Result<ValveCommand, IrrigationError> {
        self.call(|reply| ControlMessage::CloseValve { valve_id, reply })
            .await
    }

    async fn send(&self, message: ControlMessage) -> Result<(), IrrigationError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| IrrigationError::ControllerStopped)
    }

    async fn call<R>(
        &self,
        build: impl FnOnce(Reply<R>) -> ControlMessage,
    ) -> Result<R, IrrigationError> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;
        response
            .await
            .map_err(|_| IrrigationError::ControllerStopped)?
    }
}
