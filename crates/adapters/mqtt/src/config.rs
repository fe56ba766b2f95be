//! MQTT transport configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration of the broker connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Pause before polling again after a connection error, in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Capacity of the client request queue.
    pub request_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "127.0.0.1".to_string(),
            broker_port: 1883,
            client_id: "irrihub-backend".to_string(),
            keep_alive_secs: 30,
            reconnect_delay_ms: 1000,
            request_capacity: 64,
        }
    }
}

impl MqttConfig {
    /// Client options for this configuration, with a clean session.
    #[must_use]
    pub fn options(&self) -> rumqttc::MqttOptions {
        let mut options =
            rumqttc::MqttOptions::new(&self.client_id, &self.broker_host, self.broker_port);
        options.set_keep_alive(Duration::from_secs(u64::from(self.keep_alive_secs.max(5))));
        options.set_clean_session(true);
        options
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}
