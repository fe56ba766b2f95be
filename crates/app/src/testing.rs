//! In-memory port implementations for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use irrihub_domain::command::ValveCommand;
use irrihub_domain::error::IrrigationError;
use irrihub_domain::event::{BroadcastEvent, EventKind};
use irrihub_domain::time::EpochMillis;

use crate::controller::ControlMessage;
use crate::ports::{
    Broadcaster, Clock, ConfigKey, ConfigStore, HistoryLog, HistoryQuery, HistoryRecord, Transport,
};
use crate::state::{Configuration, ControlState};
use crate::tracker::CommandTracker;

/// Transport recording every publish.
pub struct RecordingTransport {
    connected: AtomicBool,
    reject_publish: AtomicBool,
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            connected: AtomicBool::new(true),
            reject_publish: AtomicBool::new(false),
            published: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingTransport {
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn reject_publish(&self, reject: bool) {
        self.reject_publish.store(reject, Ordering::SeqCst);
    }

    pub fn topics(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    pub fn commands(&self) -> Vec<ValveCommand> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| serde_json::from_slice(payload).unwrap())
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn publish(&self, topic: String, payload: Vec<u8>) -> Result<(), IrrigationError> {
        if self.reject_publish.load(Ordering::SeqCst) {
            return Err(IrrigationError::Publish("broker rejected publish".into()));
        }
        self.published.lock().unwrap().push((topic, payload));
        Ok(())
    }
}

/// Broadcaster recording every event.
#[derive(Default)]
pub struct RecordingBroadcaster {
    events: Mutex<Vec<BroadcastEvent>>,
}

impl RecordingBroadcaster {
    pub fn events(&self) -> Vec<BroadcastEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn broadcast(&self, event: BroadcastEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Config store backed by a map.
#[derive(Default)]
pub struct InMemoryConfigStore {
    values: Mutex<HashMap<ConfigKey, serde_json::Value>>,
    reject_saves: AtomicBool,
}

impl InMemoryConfigStore {
    pub fn put(&self, key: ConfigKey, value: serde_json::Value) {
        self.values.lock().unwrap().insert(key, value);
    }

    pub fn get(&self, key: ConfigKey) -> Option<serde_json::Value> {
        self.values.lock().unwrap().get(&key).cloned()
    }

    pub fn reject_saves(&self, reject: bool) {
        self.reject_saves.store(reject, Ordering::SeqCst);
    }
}

impl ConfigStore for InMemoryConfigStore {
    async fn load(&self, key: ConfigKey) -> Result<Option<serde_json::Value>, IrrigationError> {
        Ok(self.get(key))
    }

    async fn save(&self, key: ConfigKey, value: serde_json::Value) -> Result<(), IrrigationError> {
        if self.reject_saves.load(Ordering::SeqCst) {
            return Err(IrrigationError::Storage("disk full".into()));
        }
        self.put(key, value);
        Ok(())
    }
}

/// History log backed by a vector.
#[derive(Default)]
pub struct InMemoryHistory {
    records: Mutex<Vec<HistoryRecord>>,
}

impl InMemoryHistory {
    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl HistoryLog for InMemoryHistory {
    async fn append(&self, record: HistoryRecord) -> Result<(), IrrigationError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    async fn range(&self, query: HistoryQuery) -> Result<Vec<HistoryRecord>, IrrigationError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| query.matches(record))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

/// Clock that only moves when told to.
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(now: EpochMillis) -> Self {
        Self(AtomicI64::new(now))
    }

    pub fn set(&self, now: EpochMillis) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let millis = i64::try_from(by.as_millis()).unwrap();
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> EpochMillis {
        self.0.load(Ordering::SeqCst)
    }
}

/// Control state with a fresh tracker, plus the channel its timers report on.
pub fn control_state(
    config: Configuration,
) -> (ControlState, mpsc::Sender<ControlMessage>, mpsc::Receiver<ControlMessage>) {
    let (tx, rx) = mpsc::channel(32);
    let state = ControlState::new(config, CommandTracker::new(tx.downgrade()));
    (state, tx, rx)
}
