//! In-memory ports and a running controller for handler tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use irrihub_app::controller::{Controller, ControllerHandle};
use irrihub_app::event_bus::InProcessEventBus;
use irrihub_app::ports::{
    ConfigKey, ConfigStore, HistoryLog, HistoryQuery, HistoryRecord, SystemClock, Transport,
};
use irrihub_app::state::Configuration;
use irrihub_domain::command::ValveCommand;
use irrihub_domain::error::IrrigationError;

use crate::state::AppState;

pub(crate) struct FakeTransport {
    connected: AtomicBool,
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl FakeTransport {
    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub(crate) fn commands(&self) -> Vec<(String, ValveCommand)> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(topic, payload)| (topic.clone(), serde_json::from_slice(payload).unwrap()))
            .collect()
    }
}

impl Transport for FakeTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn publish(&self, topic: String, payload: Vec<u8>) -> Result<(), IrrigationError> {
        self.published.lock().unwrap().push((topic, payload));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryConfigStore(Mutex<HashMap<ConfigKey, Value>>);

impl ConfigStore for MemoryConfigStore {
    async fn load(&self, key: ConfigKey) -> Result<Option<Value>, IrrigationError> {
        Ok(self.0.lock().unwrap().get(&key).cloned())
    }

    async fn save(&self, key: ConfigKey, value: Value) -> Result<(), IrrigationError> {
        self.0.lock().unwrap().insert(key, value);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryHistory(Mutex<Vec<HistoryRecord>>);

impl HistoryLog for MemoryHistory {
    async fn append(&self, record: HistoryRecord) -> Result<(), IrrigationError> {
        self.0.lock().unwrap().push(record);
        Ok(())
    }

    async fn range(&self, query: HistoryQuery) -> Result<Vec<HistoryRecord>, IrrigationError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|record| query.matches(record))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

pub(crate) struct TestApp {
    pub(crate) router: Router,
    pub(crate) controller: ControllerHandle,
    pub(crate) transport: Arc<FakeTransport>,
    pub(crate) history: Arc<MemoryHistory>,
    pub(crate) event_bus: Arc<InProcessEventBus>,
}

impl TestApp {
    /// Spawn a controller on the current runtime, connected transport.
    pub(crate) fn start() -> Self {
        Self::with_configuration(Configuration::default())
    }

    pub(crate) fn with_configuration(configuration: Configuration) -> Self {
        let transport = Arc::new(FakeTransport {
            connected: AtomicBool::new(true),
            published: Mutex::default(),
        });
        let event_bus = Arc::new(InProcessEventBus::new(64));
        let history = Arc::new(MemoryHistory::default());
        let (controller, handle) = Controller::new(
            configuration,
            Arc::clone(&transport),
            Arc::clone(&event_bus),
            Arc::new(MemoryConfigStore::default()),
            Arc::clone(&history),
            SystemClock,
            64,
        );
        tokio::spawn(controller.run());

        let state = AppState::new(handle.clone(), Arc::clone(&event_bus), Arc::clone(&history));
        Self {
            router: crate::router::build(state),
            controller: handle,
            transport,
            history,
            event_bus,
        }
    }
}

/// Send a request through the router and decode the JSON response body
/// (`Value::Null` when empty).
pub(crate) async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
