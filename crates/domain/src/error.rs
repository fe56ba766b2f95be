//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`IrrigationError`] via `From`.

/// Boxed source error carried across port boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Base error for every fallible core operation.
#[derive(Debug, thiserror::Error)]
pub enum IrrigationError {
    /// A command was dispatched while the transport was disconnected.
    #[error("transport unavailable")]
    TransportUnavailable,

    /// The transport accepted the connection but rejected the publish.
    #[error("failed to publish command")]
    Publish(#[source] BoxError),

    /// An inbound payload could not be turned into a sensor or valve message.
    #[error("malformed message")]
    MalformedMessage(#[from] MalformedMessage),

    /// A strategy or policy update failed validation.
    #[error("configuration rejected")]
    ConfigurationRejected(#[from] ConfigurationRejected),

    /// The config store or history log failed.
    #[error("storage error")]
    Storage(#[source] BoxError),

    /// The controller task is no longer running.
    #[error("controller stopped")]
    ControllerStopped,
}

/// Reasons an inbound transport message is dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedMessage {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("missing device identifier")]
    MissingIdentifier,

    #[error("unrecognised topic: {0}")]
    UnknownTopic(String),
}

/// Reasons a configuration update is refused.
///
/// A rejected update never replaces the stored configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationRejected {
    #[error("humidity thresholds must be finite numbers")]
    NonFiniteThreshold,

    #[error("low humidity threshold ({low}) must be below high threshold ({high})")]
    InvertedThresholds { low: f64, high: f64 },

    #[error("cooldown must be a finite, non-negative number of minutes")]
    InvalidCooldown,

    #[error("default open duration must be positive")]
    ZeroOpenDuration,

    #[error("policies must be an array")]
    PoliciesNotArray,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
