//! Config store port: persistence of runtime configuration documents.

use std::future::Future;

use irrihub_domain::error::IrrigationError;

/// The configuration documents the core persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigKey {
    Strategy,
    Policies,
    Override,
    Devices,
}

impl ConfigKey {
    pub const ALL: [Self; 4] = [Self::Strategy, Self::Policies, Self::Override, Self::Devices];

    /// Storage name of the key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strategy => "strategy",
            Self::Policies => "policies",
            Self::Override => "override",
            Self::Devices => "devices",
        }
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value store of JSON configuration documents.
pub trait ConfigStore {
    /// Load the document stored under `key`, `None` if never saved.
    fn load(
        &self,
        key: ConfigKey,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, IrrigationError>> + Send;

    /// Replace the document stored under `key`.
    fn save(
        &self,
        key: ConfigKey,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), IrrigationError>> + Send;
}

impl<T: ConfigStore + Send + Sync> ConfigStore for std::sync::Arc<T> {
    fn load(
        &self,
        key: ConfigKey,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, IrrigationError>> + Send {
        (**self).load(key)
    }

    fn save(
        &self,
        key: ConfigKey,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), IrrigationError>> + Send {
        (**self).save(key, value)
    }
}
