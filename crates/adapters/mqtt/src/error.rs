//! MQTT adapter error types.

use irrihub_domain::error::IrrigationError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The client request queue refused the request (event loop gone or full).
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The connection to the broker failed.
    #[error("MQTT connection error")]
    Connection(#[source] rumqttc::ConnectionError),
}

impl MqttError {
    /// Convert into an [`IrrigationError::Publish`] for propagation across
    /// port boundaries.
    #[must_use]
    pub fn into_domain(self) -> IrrigationError {
        IrrigationError::Publish(Box::new(self))
    }
}

impl From<MqttError> for IrrigationError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_client_error_to_publish_error() {
        let (client, eventloop) =
            rumqttc::AsyncClient::new(rumqttc::MqttOptions::new("test", "127.0.0.1", 1883), 1);
        drop(eventloop);
        let err = client
            .try_publish("t", rumqttc::QoS::AtLeastOnce, false, Vec::new())
            .unwrap_err();

        let domain: IrrigationError = MqttError::Client(err).into();
        assert!(matches!(domain, IrrigationError::Publish(_)));
    }

    #[test]
    fn should_display_client_error() {
        let (client, eventloop) =
            rumqttc::AsyncClient::new(rumqttc::MqttOptions::new("test", "127.0.0.1", 1883), 1);
        drop(eventloop);
        let err = client
            .try_publish("t", rumqttc::QoS::AtLeastOnce, false, Vec::new())
            .unwrap_err();
        assert_eq!(MqttError::Client(err).to_string(), "MQTT client error");
    }
}
