//! Broker event loop: connection tracking, subscriptions and inbound
//! forwarding to the controller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};

use irrihub_app::controller::ControllerHandle;
use irrihub_domain::error::IrrigationError;
use irrihub_domain::topic;

/// What the controller needs to hear about from one broker event.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum TransportEvent {
    Connected,
    Message { topic: String, payload: Vec<u8> },
}

impl TransportEvent {
    pub(crate) fn from_event(event: Event) -> Option<Self> {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => Some(Self::Connected),
            Event::Incoming(Packet::Publish(publish)) => Some(Self::Message {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
            }),
            _ => None,
        }
    }
}

/// Drives the rumqttc event loop. Run it on its own task.
pub struct MqttEventLoop {
    client: AsyncClient,
    eventloop: EventLoop,
    connected: Arc<AtomicBool>,
    reconnect_delay: Duration,
}

impl MqttEventLoop {
    pub(crate) fn new(
        client: AsyncClient,
        eventloop: EventLoop,
        connected: Arc<AtomicBool>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            client,
            eventloop,
            connected,
            reconnect_delay,
        }
    }

    /// Poll the broker until the controller stops.
    ///
    /// A connection error marks the transport disconnected, and polling
    /// resumes after the reconnect delay.
    pub async fn run(mut self, controller: ControllerHandle) {
        tracing::info!("mqtt event loop started");
        loop {
            let forwarded = match self.eventloop.poll().await {
                Ok(event) => match TransportEvent::from_event(event) {
                    Some(event) => self.forward(event, &controller).await,
                    None => Ok(()),
                },
                Err(err) => {
                    tracing::error!(error = %err, "mqtt connection error");
                    let result = if self.connected.swap(false, Ordering::AcqRel) {
                        controller.transport_status(false).await
                    } else {
                        Ok(())
                    };
                    tokio::time::sleep(self.reconnect_delay).await;
                    result
                }
            };
            if let Err(IrrigationError::ControllerStopped) = forwarded {
                break;
            }
        }
        tracing::info!("mqtt event loop stopped");
    }

    async fn forward(
        &mut self,
        event: TransportEvent,
        controller: &ControllerHandle,
    ) -> Result<(), IrrigationError> {
        match event {
            TransportEvent::Connected => {
                tracing::info!("mqtt connected");
                self.connected.store(true, Ordering::Release);
                for filter in [topic::SENSOR_UPLINK_FILTER, topic::VALVE_STATUS_FILTER] {
                    if let Err(err) = self.client.try_subscribe(filter, QoS::AtLeastOnce) {
                        tracing::warn!(filter, error = %err, "unable to subscribe");
                    }
                }
                controller.transport_status(true).await
            }
            TransportEvent::Message { topic, payload } => controller.ingest(topic, payload).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use rumqttc::{ConnAck, ConnectReturnCode, Outgoing, Publish};

    use super::*;

    #[test]
    fn should_map_connack_to_connected() {
        let event = Event::Incoming(Packet::ConnAck(ConnAck::new(
            ConnectReturnCode::Success,
            false,
        )));
        assert_eq!(
            TransportEvent::from_event(event),
            Some(TransportEvent::Connected)
        );
    }

    #[test]
    fn should_map_publish_to_message() {
        let publish = Publish::new(
            "farm/sensors/S1/uplink",
            QoS::AtLeastOnce,
            br#"{"humidityPct":30}"#.to_vec(),
        );
        let event = Event::Incoming(Packet::Publish(publish));
        assert_eq!(
            TransportEvent::from_event(event),
            Some(TransportEvent::Message {
                topic: "farm/sensors/S1/uplink".to_string(),
                payload: br#"{"humidityPct":30}"#.to_vec(),
            })
        );
    }

    #[test]
    fn should_ignore_other_packets() {
        assert_eq!(TransportEvent::from_event(Event::Incoming(Packet::PingResp)), None);
        assert_eq!(TransportEvent::from_event(Event::Outgoing(Outgoing::PingReq)), None);
    }
}
