//! JSON handlers for the irrigation strategy and the operating mode.

use axum::Json;
use axum::extract::State;
use serde_json::Value;

use irrihub_app::ports::HistoryLog;
use irrihub_domain::error::ConfigurationRejected;
use irrihub_domain::strategy::{Mode, Strategy, StrategyPatch};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/strategy`
pub async fn get<H>(State(state): State<AppState<H>>) -> Result<Json<Strategy>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let overview = state.controller.overview().await?;
    Ok(Json(overview.configuration.strategy))
}

/// `PUT /api/strategy`: partial update overlaid on the current strategy.
pub async fn update<H>(
    State(state): State<AppState<H>>,
    Json(body): Json<Value>,
) -> Result<Json<Strategy>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let patch: StrategyPatch = serde_json::from_value(body)
        .map_err(|err| ConfigurationRejected::InvalidPayload(err.to_string()))?;
    let strategy = state.controller.update_strategy(patch).await?;
    Ok(Json(strategy))
}

/// `POST /api/mode`: `{"mode": "auto" | "manual"}`.
pub async fn set_mode<H>(
    State(state): State<AppState<H>>,
    Json(body): Json<Value>,
) -> Result<Json<Strategy>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let mode = match body.get("mode").and_then(Value::as_str) {
        Some("auto") => Mode::Auto,
        Some("manual") => Mode::Manual,
        _ => return Err(ApiError::BadRequest("mode must be auto|manual".to_string())),
    };
    let strategy = state.controller.set_mode(mode).await?;
    Ok(Json(strategy))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::testing::{TestApp, send};

    #[tokio::test]
    async fn should_return_default_strategy() {
        let app = TestApp::start();

        let (status, body) = send(&app.router, Method::GET, "/api/strategy", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "auto");
        assert_eq!(body["autoMethod"], "threshold");
        assert_eq!(body["humidityLowPct"], 35.0);
        assert_eq!(body["humidityHighPct"], 45.0);
    }

    #[tokio::test]
    async fn should_overlay_partial_update() {
        let app = TestApp::start();

        let (status, body) = send(
            &app.router,
            Method::PUT,
            "/api/strategy",
            Some(json!({"humidityLowPct": 30, "autoMethod": "policy"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["humidityLowPct"], 30.0);
        assert_eq!(body["humidityHighPct"], 45.0);
        assert_eq!(body["autoMethod"], "policy");

        let (_, body) = send(&app.router, Method::GET, "/api/strategy", None).await;
        assert_eq!(body["autoMethod"], "policy");
    }

    #[tokio::test]
    async fn should_reject_inverted_thresholds() {
        let app = TestApp::start();

        let (status, body) = send(
            &app.router,
            Method::PUT,
            "/api/strategy",
            Some(json!({"humidityLowPct": 60})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);

        let (_, body) = send(&app.router, Method::GET, "/api/strategy", None).await;
        assert_eq!(body["humidityLowPct"], 35.0);
    }

    #[tokio::test]
    async fn should_reject_mistyped_fields() {
        let app = TestApp::start();

        let (status, _) = send(
            &app.router,
            Method::PUT,
            "/api/strategy",
            Some(json!({"cooldownMinutes": "often"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_switch_mode() {
        let app = TestApp::start();

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/mode",
            Some(json!({"mode": "manual"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "manual");
    }

    #[tokio::test]
    async fn should_reject_unknown_mode() {
        let app = TestApp::start();

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/mode",
            Some(json!({"mode": "turbo"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "mode must be auto|manual");
    }
}
