//! JSON handlers for manual valve control.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::Value;

use irrihub_app::ports::HistoryLog;
use irrihub_domain::command::{FALLBACK_OPEN_DURATION_SECS, ValveCommand};
use irrihub_domain::manual_override::ManualOverride;

use crate::api::numeric;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of a successful open or close.
#[derive(Serialize)]
pub struct CommandBody {
    pub ok: bool,
    pub command: ValveCommand,
}

/// Body of a successful toggle.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleBody {
    pub ok: bool,
    pub manual_override: ManualOverride,
}

/// `POST /api/valves/:id/open`: optional `{"durationSec": n}`.
pub async fn open<H>(
    State(state): State<AppState<H>>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<CommandBody>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let duration_sec = open_duration(body.as_ref().and_then(|Json(body)| body.get("durationSec")));
    let command = state.controller.open_valve(id, duration_sec).await?;
    Ok(Json(CommandBody { ok: true, command }))
}

/// `POST /api/valves/:id/close`
pub async fn close<H>(
    State(state): State<AppState<H>>,
    Path(id): Path<String>,
) -> Result<Json<CommandBody>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let command = state.controller.close_valve(id).await?;
    Ok(Json(CommandBody { ok: true, command }))
}

/// `POST /api/valves/:id/toggle`: optional `{"durationSec": n}` used when
/// the toggle opens the valve.
pub async fn toggle<H>(
    State(state): State<AppState<H>>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<ToggleBody>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let duration_sec = body
        .as_ref()
        .and_then(|Json(body)| body.get("durationSec"))
        .and_then(numeric);
    let manual_override = state.controller.toggle_valve(id, duration_sec).await?;
    Ok(Json(ToggleBody {
        ok: true,
        manual_override,
    }))
}

/// Requested manual open duration in seconds: absent, `null` or non-numeric
/// falls back to the default, anything non-positive means no auto-close.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn open_duration(value: Option<&Value>) -> u64 {
    let secs = match value {
        None | Some(Value::Null) => return FALLBACK_OPEN_DURATION_SECS,
        Some(value) => numeric(value).unwrap_or(f64::NAN),
    };
    if !secs.is_finite() {
        FALLBACK_OPEN_DURATION_SECS
    } else if secs <= 0.0 {
        0
    } else {
        secs.round() as u64
    }
}
