//! Transport port: the publish/subscribe link to the devices.

use std::future::Future;

use irrihub_domain::error::IrrigationError;

/// Outbound side of the device transport.
///
/// Inbound messages are not pulled through this trait: the transport
/// adapter pushes them to the controller through its handle.
pub trait Transport {
    /// Whether the transport is currently connected to the broker.
    fn is_connected(&self) -> bool;

    /// Hand `payload` to the transport for delivery on `topic` (at least
    /// once). Resolves once the client accepted the message, not when the
    /// device received it.
    fn publish(
        &self,
        topic: String,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), IrrigationError>> + Send;
}

impl<T: Transport + Send + Sync> Transport for std::sync::Arc<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn publish(
        &self,
        topic: String,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), IrrigationError>> + Send {
        (**self).publish(topic, payload)
    }
}
