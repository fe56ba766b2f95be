//! JSON API handler modules and the `/api` sub-router.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod history;
#[allow(clippy::missing_errors_doc)]
pub mod manual_override;
#[allow(clippy::missing_errors_doc)]
pub mod policies;
#[allow(clippy::missing_errors_doc)]
pub mod sse;
#[allow(clippy::missing_errors_doc)]
pub mod strategy;
#[allow(clippy::missing_errors_doc)]
pub mod valves;

use axum::Router;
use axum::routing::{get, post};
use serde_json::Value;

use irrihub_app::ports::HistoryLog;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<H>() -> Router<AppState<H>>
where
    H: HistoryLog + Send + Sync + 'static,
{
    Router::new()
        // Configuration
        .route("/devices", get(devices::list::<H>))
        .route(
            "/strategy",
            get(strategy::get::<H>).put(strategy::update::<H>),
        )
        .route("/mode", post(strategy::set_mode::<H>))
        .route(
            "/policies",
            get(policies::list::<H>).put(policies::replace::<H>),
        )
        .route(
            "/override",
            get(manual_override::get::<H>).post(manual_override::update::<H>),
        )
        // Live state
        .route("/latest", get(devices::latest::<H>))
        .route("/events/stream", get(sse::stream::<H>))
        .route("/history", get(history::list::<H>))
        // Valve control
        .route("/valves/{id}/open", post(valves::open::<H>))
        .route("/valves/{id}/close", post(valves::close::<H>))
        .route("/valves/{id}/toggle", post(valves::toggle::<H>))
}

/// A JSON number, or a string holding one.
pub(crate) fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
