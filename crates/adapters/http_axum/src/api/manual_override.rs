//! JSON handlers for the manual override registry.

use axum::Json;
use axum::extract::State;
use serde_json::Value;

use irrihub_app::ports::HistoryLog;
use irrihub_domain::manual_override::{ManualOverride, OverrideRequest};
use irrihub_domain::valve::ValveState;

use crate::api::numeric;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/override`
pub async fn get<H>(State(state): State<AppState<H>>) -> Result<Json<ManualOverride>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let overview = state.controller.overview().await?;
    Ok(Json(overview.configuration.manual_override))
}

/// `POST /api/override`: `{"globalEnabled": bool}` or
/// `{"valveId", "enabled"?, "desiredState"?, "durationSec"?}`.
pub async fn update<H>(
    State(state): State<AppState<H>>,
    Json(body): Json<Value>,
) -> Result<Json<ManualOverride>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let request = parse_request(&body)
        .ok_or_else(|| ApiError::BadRequest("provide globalEnabled or valveId".to_string()))?;
    let registry = state.controller.set_override(request).await?;
    Ok(Json(registry))
}

/// A valve id wins over `globalEnabled`. A `desiredState` of `null` clears
/// the pinned state, any other unknown value is ignored.
pub(crate) fn parse_request(body: &Value) -> Option<OverrideRequest> {
    let valve_id = match body.get("valveId") {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };
    let global = body.get("globalEnabled").and_then(Value::as_bool);

    match (valve_id, global) {
        (Some(valve_id), _) => Some(OverrideRequest {
            enabled: body.get("enabled").and_then(Value::as_bool),
            valve_id: Some(valve_id),
            desired_state: match body.get("desiredState") {
                Some(Value::Null) => Some(None),
                Some(Value::String(state)) if state == "OPEN" => Some(Some(ValveState::Open)),
                Some(Value::String(state)) if state == "CLOSE" => Some(Some(ValveState::Close)),
                _ => None,
            },
            duration_sec: body.get("durationSec").and_then(numeric),
        }),
        (None, Some(enabled)) => Some(OverrideRequest::global(enabled)),
        (None, None) => None,
    }
}
