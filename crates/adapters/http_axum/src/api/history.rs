//! JSON handler for sensor and valve history.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use irrihub_app::ports::{DEFAULT_HISTORY_LIMIT, HistoryCategory, HistoryLog, HistoryQuery};
use irrihub_domain::time::EpochMillis;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters of the history endpoint, kept as text so malformed
/// numbers fall back to their defaults instead of failing the request.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub device_id: Option<String>,
    /// `sensor` (default) or `valve`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryBody {
    pub device_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub count: usize,
    pub rows: Vec<Value>,
}

/// `GET /api/history?deviceId=&type=&from=&to=&limit=`
pub async fn list<H>(
    State(state): State<AppState<H>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryBody>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let device_id = params
        .device_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("deviceId required".to_string()))?;
    let (category, kind) = match params.kind.as_deref() {
        Some("valve") => (HistoryCategory::Valves, "valve"),
        _ => (HistoryCategory::Sensors, "sensor"),
    };

    let query = HistoryQuery {
        from: params.from.as_deref().and_then(parse_millis),
        to: params.to.as_deref().and_then(parse_millis),
        limit: params
            .limit
            .as_deref()
            .and_then(|limit| limit.parse().ok())
            .unwrap_or(DEFAULT_HISTORY_LIMIT),
        ..HistoryQuery::new(category, device_id.clone())
    };
    let rows: Vec<Value> = state
        .history
        .range(query)
        .await?
        .into_iter()
        .map(|record| record.payload)
        .collect();

    Ok(Json(HistoryBody {
        device_id,
        kind,
        count: rows.len(),
        rows,
    }))
}

#[allow(clippy::cast_possible_truncation)]
fn parse_millis(value: &str) -> Option<EpochMillis> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|millis| millis.is_finite())
        .map(|millis| millis as EpochMillis)
}
