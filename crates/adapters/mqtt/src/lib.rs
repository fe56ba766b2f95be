//! # irrihub-adapter-mqtt
//!
//! MQTT adapter: the field transport of irrihub.
//!
//! ## Responsibilities
//! - Connect to the broker and stay connected (rumqttc reconnects on poll)
//! - Subscribe to sensor uplinks and valve status topics on every connect
//! - Forward inbound messages and connectivity changes to the controller
//! - Publish valve commands through the [`Transport`](irrihub_app::ports::Transport) port
//!
//! ## Dependency rule
//! Same as other adapters: depends on `irrihub-app` and `irrihub-domain`.

pub mod config;
pub mod error;
pub mod event_loop;
pub mod transport;

pub use config::MqttConfig;
pub use error::MqttError;
pub use event_loop::MqttEventLoop;
pub use transport::MqttTransport;

/// Create the transport and the event loop driving it.
///
/// Nothing touches the network until [`MqttEventLoop::run`] is polled.
#[must_use]
pub fn connect(config: &MqttConfig) -> (MqttTransport, MqttEventLoop) {
    let (client, eventloop) = rumqttc::AsyncClient::new(config.options(), config.request_capacity);
    let transport = MqttTransport::new(client.clone());
    let event_loop = MqttEventLoop::new(
        client,
        eventloop,
        transport.connection_flag(),
        config.reconnect_delay(),
    );
    (transport, event_loop)
}
