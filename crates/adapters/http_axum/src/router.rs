//! Axum router assembly.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use irrihub_app::ports::HistoryLog;
use irrihub_domain::time::{EpochMillis, now_millis};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API routes under `/api` and serves `/health` at the root.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<H>(state: AppState<H>) -> Router
where
    H: HistoryLog + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check::<H>))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthBody {
    ok: bool,
    ts: EpochMillis,
    mqtt_connected: bool,
}

async fn health_check<H>(State(state): State<AppState<H>>) -> Result<Json<HealthBody>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let overview = state.controller.overview().await?;
    Ok(Json(HealthBody {
        ok: true,
        ts: now_millis(),
        mqtt_connected: overview.transport_connected,
    }))
}
