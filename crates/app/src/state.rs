//! Owned state of the control core.
//!
//! [`ControlState`] is owned by the controller task and passed by mutable
//! reference into the dispatcher, the decision engine and the services.

use serde::Serialize;
use serde::de::DeserializeOwned;

use irrihub_domain::device::DeviceRegistry;
use irrihub_domain::error::IrrigationError;
use irrihub_domain::manual_override::ManualOverride;
use irrihub_domain::policy::{self, Policy};
use irrihub_domain::strategy::Strategy;
use irrihub_domain::time::EpochMillis;

use crate::ports::{ConfigKey, ConfigStore};
use crate::store::DeviceStateStore;
use crate::tracker::CommandTracker;

/// Persisted runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub strategy: Strategy,
    pub policies: Vec<Policy>,
    pub manual_override: ManualOverride,
    pub devices: DeviceRegistry,
}

impl Configuration {
    /// Load every configuration document, substituting defaults for missing
    /// or unreadable ones, then write the result back so the store always
    /// holds a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read or written.
    #[tracing::instrument(skip(store))]
    pub async fn load<S: ConfigStore>(store: &S, now: EpochMillis) -> Result<Self, IrrigationError> {
        let mut strategy: Strategy = load_or_default(store, ConfigKey::Strategy).await?;
        if strategy.updated_at == 0 {
            strategy.updated_at = now;
        }
        let policies = match store.load(ConfigKey::Policies).await? {
            Some(value) => policy::normalize(&value, now).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "stored policies unreadable, starting empty");
                Vec::new()
            }),
            None => Vec::new(),
        };
        let manual_override = load_or_default(store, ConfigKey::Override).await?;
        let devices = load_or_default(store, ConfigKey::Devices).await?;

        let config = Self {
            strategy,
            policies,
            manual_override,
            devices,
        };
        config.save_all(store).await?;
        tracing::info!(
            mode = ?config.strategy.mode,
            method = ?config.strategy.auto_method,
            policies = config.policies.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    async fn save_all<S: ConfigStore>(&self, store: &S) -> Result<(), IrrigationError> {
        store.save(ConfigKey::Strategy, to_document(&self.strategy)).await?;
        store.save(ConfigKey::Policies, to_document(&self.policies)).await?;
        store.save(ConfigKey::Override, to_document(&self.manual_override)).await?;
        store.save(ConfigKey::Devices, to_document(&self.devices)).await
    }
}

async fn load_or_default<S, T>(store: &S, key: ConfigKey) -> Result<T, IrrigationError>
where
    S: ConfigStore,
    T: DeserializeOwned + Default,
{
    let Some(value) = store.load(key).await? else {
        return Ok(T::default());
    };
    Ok(serde_json::from_value(value).unwrap_or_else(|err| {
        tracing::warn!(%key, error = %err, "stored configuration unreadable, using defaults");
        T::default()
    }))
}

/// Serialize a configuration document.
pub(crate) fn to_document(value: &impl Serialize) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// All mutable core state.
pub struct ControlState {
    pub store: DeviceStateStore,
    pub strategy: Strategy,
    pub policies: Vec<Policy>,
    pub manual_override: ManualOverride,
    pub devices: DeviceRegistry,
    pub tracker: CommandTracker,
}

impl ControlState {
    #[must_use]
    pub fn new(config: Configuration, tracker: CommandTracker) -> Self {
        Self {
            store: DeviceStateStore::new(),
            strategy: config.strategy,
            policies: config.policies,
            manual_override: config.manual_override,
            devices: config.devices,
            tracker,
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn configuration(&self) -> Configuration {
        Configuration {
            strategy: self.strategy.clone(),
            policies: self.policies.clone(),
            manual_override: self.manual_override.clone(),
            devices: self.devices.clone(),
        }
    }
}
