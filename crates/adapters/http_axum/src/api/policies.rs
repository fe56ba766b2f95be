//! JSON handlers for per-sensor irrigation policies.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::Value;

use irrihub_app::ports::HistoryLog;
use irrihub_domain::policy::Policy;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct PoliciesBody {
    pub policies: Vec<Policy>,
}

/// `GET /api/policies`
pub async fn list<H>(State(state): State<AppState<H>>) -> Result<Json<PoliciesBody>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let overview = state.controller.overview().await?;
    Ok(Json(PoliciesBody {
        policies: overview.configuration.policies,
    }))
}

/// `PUT /api/policies`: `{"policies": [...]}` or a bare array, replacing
/// the whole collection.
pub async fn replace<H>(
    State(state): State<AppState<H>>,
    Json(body): Json<Value>,
) -> Result<Json<PoliciesBody>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let policies = state.controller.replace_policies(body).await?;
    Ok(Json(PoliciesBody { policies }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::testing::{TestApp, send};

    #[tokio::test]
    async fn should_start_without_policies() {
        let app = TestApp::start();

        let (status, body) = send(&app.router, Method::GET, "/api/policies", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"policies": []}));
    }

    #[tokio::test]
    async fn should_normalize_and_store_policies() {
        let app = TestApp::start();

        let (status, body) = send(
            &app.router,
            Method::PUT,
            "/api/policies",
            Some(json!([
                {"sensorId": "S1", "valveId": "V1", "humidityThreshold": "40", "durationSeconds": 90},
                {"sensorId": "S2", "valveId": "V2", "humidityThreshold": "dry"}
            ])),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let policies = body["policies"].as_array().unwrap();
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0]["sensorId"], "S1");
        assert_eq!(policies[0]["humidityThreshold"], 40.0);
        assert_eq!(policies[0]["active"], true);
        assert!(policies[0]["id"].as_str().is_some_and(|id| !id.is_empty()));

        let (_, body) = send(&app.router, Method::GET, "/api/policies", None).await;
        assert_eq!(body["policies"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_reject_non_array_body() {
        let app = TestApp::start();

        let (status, body) = send(
            &app.router,
            Method::PUT,
            "/api/policies",
            Some(json!({"policies": "all of them"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "policies must be an array");
    }
}
