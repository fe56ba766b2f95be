//! Configuration service: strategy, mode and policy updates.
//!
//! Every update is validated, persisted, and only then swapped into the
//! controller state, so a rejected or unsaved update leaves the running
//! configuration untouched.

use irrihub_domain::error::IrrigationError;
use irrihub_domain::event::{BroadcastEvent, EventKind};
use irrihub_domain::policy::{self, Policy};
use irrihub_domain::strategy::{Mode, Strategy, StrategyPatch};
use irrihub_domain::time::EpochMillis;

use crate::ports::{Broadcaster, ConfigKey, ConfigStore};
use crate::state::{ControlState, to_document};

/// Overlay `patch` on the current strategy.
///
/// # Errors
///
/// Returns [`IrrigationError::ConfigurationRejected`] if the result is
/// invalid, or a storage error if it cannot be persisted.
#[tracing::instrument(skip_all)]
pub async fn update_strategy<S, B>(
    state: &mut ControlState,
    store: &S,
    broadcaster: &B,
    patch: StrategyPatch,
    now: EpochMillis,
) -> Result<Strategy, IrrigationError>
where
    S: ConfigStore,
    B: Broadcaster,
{
    let next = state.strategy.apply(patch, now)?;
    replace_strategy(state, store, broadcaster, next, now).await
}

/// Switch between automatic and manual mode.
///
/// # Errors
///
/// Returns a storage error if the strategy cannot be persisted.
#[tracing::instrument(skip(state, store, broadcaster))]
pub async fn set_mode<S, B>(
    state: &mut ControlState,
    store: &S,
    broadcaster: &B,
    mode: Mode,
    now: EpochMillis,
) -> Result<Strategy, IrrigationError>
where
    S: ConfigStore,
    B: Broadcaster,
{
    let next = state.strategy.with_mode(mode, now);
    replace_strategy(state, store, broadcaster, next, now).await
}

async fn replace_strategy<S, B>(
    state: &mut ControlState,
    store: &S,
    broadcaster: &B,
    next: Strategy,
    now: EpochMillis,
) -> Result<Strategy, IrrigationError>
where
    S: ConfigStore,
    B: Broadcaster,
{
    store.save(ConfigKey::Strategy, to_document(&next)).await?;
    tracing::info!(mode = ?next.mode, method = ?next.auto_method, "strategy updated");
    state.strategy = next;
    broadcaster.broadcast(BroadcastEvent::new(EventKind::Strategy, now, &state.strategy));
    Ok(state.strategy.clone())
}

/// Replace the whole policy collection with the normalized `body`.
///
/// # Errors
///
/// Returns [`IrrigationError::ConfigurationRejected`] when `body` holds no
/// array, or a storage error if the policies cannot be persisted.
#[tracing::instrument(skip_all)]
pub async fn replace_policies<S, B>(
    state: &mut ControlState,
    store: &S,
    broadcaster: &B,
    body: &serde_json::Value,
    now: EpochMillis,
) -> Result<Vec<Policy>, IrrigationError>
where
    S: ConfigStore,
    B: Broadcaster,
{
    let policies = policy::normalize(body, now)?;
    store.save(ConfigKey::Policies, to_document(&policies)).await?;
    tracing::info!(count = policies.len(), "policies replaced");
    state.policies = policies;
    broadcaster.broadcast(BroadcastEvent::new(
        EventKind::Policies,
        now,
        serde_json::json!({ "policies": &state.policies }),
    ));
    Ok(state.policies.clone())
}
