//! JSON handlers for the device registry and the latest device states.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use irrihub_app::ports::HistoryLog;
use irrihub_app::store::DeviceSnapshot;
use irrihub_domain::device::DeviceRegistry;
use irrihub_domain::time::{EpochMillis, now_millis};

use crate::error::ApiError;
use crate::state::AppState;

/// Latest snapshot, stamped with the time it was taken.
#[derive(Serialize)]
pub struct LatestBody {
    pub ts: EpochMillis,
    #[serde(flatten)]
    pub snapshot: DeviceSnapshot,
}

/// `GET /api/devices`
pub async fn list<H>(State(state): State<AppState<H>>) -> Result<Json<DeviceRegistry>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let overview = state.controller.overview().await?;
    Ok(Json(overview.configuration.devices))
}

/// `GET /api/latest`
pub async fn latest<H>(State(state): State<AppState<H>>) -> Result<Json<LatestBody>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    let snapshot = state.controller.latest().await?;
    Ok(Json(LatestBody {
        ts: now_millis(),
        snapshot,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use irrihub_app::state::Configuration;
    use irrihub_domain::device::DeviceRef;

    use crate::testing::{TestApp, send};

    #[tokio::test]
    async fn should_list_device_registry() {
        let mut configuration = Configuration::default();
        configuration.devices.sensors.push(DeviceRef::new("S1", "Z2"));
        let app = TestApp::with_configuration(configuration);

        let (status, body) = send(&app.router, Method::GET, "/api/devices", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sensors"][0]["id"], "S1");
        assert_eq!(body["sensors"][0]["zone"], "Z2");
        assert_eq!(body["valves"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn should_return_latest_readings() {
        let app = TestApp::start();
        app.controller
            .ingest(
                "farm/sensors/S1/uplink".to_string(),
                br#"{"deviceId":"S1","humidityPct":41.5,"ts":1000}"#.to_vec(),
            )
            .await
            .unwrap();

        let (status, body) = send(&app.router, Method::GET, "/api/latest", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["ts"].as_i64().unwrap() > 0);
        assert_eq!(body["sensors"][0]["deviceId"], "S1");
        assert_eq!(body["sensors"][0]["humidityPct"], 41.5);
        assert!(body["valves"].as_array().unwrap().is_empty());
    }
}
