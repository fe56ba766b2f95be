//! [`Transport`] implementation over a rumqttc client.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rumqttc::{AsyncClient, QoS};

use irrihub_app::ports::Transport;
use irrihub_domain::error::IrrigationError;

use crate::error::MqttError;

/// Publishes valve commands with QoS 1.
///
/// Publishing never waits on a full request queue; it fails with a publish
/// error instead.
///
/// Connectivity is tracked by the [`MqttEventLoop`](crate::MqttEventLoop)
/// sharing this transport's connection flag.
#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
}

impl MqttTransport {
    pub(crate) fn new(client: AsyncClient) -> Self {
        Self {
            client,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn connection_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.connected)
    }
}

impl Transport for MqttTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn publish(&self, topic: String, payload: Vec<u8>) -> Result<(), IrrigationError> {
        self.client
            .try_publish(topic, QoS::AtLeastOnce, false, payload)
            .map_err(|err| MqttError::Client(err).into_domain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MqttConfig;

    #[test]
    fn should_start_disconnected() {
        let (transport, _event_loop) = crate::connect(&MqttConfig::default());
        assert!(!transport.is_connected());
    }

    #[test]
    fn should_follow_shared_connection_flag() {
        let (transport, _event_loop) = crate::connect(&MqttConfig::default());
        transport.connection_flag().store(true, Ordering::Release);
        assert!(transport.is_connected());
    }

    #[tokio::test]
    async fn should_queue_publish_while_event_loop_is_alive() {
        let (transport, _event_loop) = crate::connect(&MqttConfig::default());
        let result = transport
            .publish("farm/valves/V1/downlink".to_string(), b"{}".to_vec())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn should_fail_publish_instead_of_waiting_on_full_queue() {
        let config = MqttConfig {
            request_capacity: 1,
            ..MqttConfig::default()
        };
        let (transport, _event_loop) = crate::connect(&config);

        let first = transport
            .publish("farm/valves/V1/downlink".to_string(), b"{}".to_vec())
            .await;
        let second = transport
            .publish("farm/valves/V2/downlink".to_string(), b"{}".to_vec())
            .await;

        assert!(first.is_ok());
        assert!(matches!(second, Err(IrrigationError::Publish(_))));
    }

    #[tokio::test]
    async fn should_fail_publish_once_event_loop_is_gone() {
        let (transport, event_loop) = crate::connect(&MqttConfig::default());
        drop(event_loop);
        let result = transport
            .publish("farm/valves/V1/downlink".to_string(), b"{}".to_vec())
            .await;
        assert!(matches!(result, Err(IrrigationError::Publish(_))));
    }
}
