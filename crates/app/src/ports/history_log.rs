//! History log port: append-only record of sensor and valve messages.

use std::future::Future;

use serde::{Deserialize, Serialize};

use irrihub_domain::error::IrrigationError;
use irrihub_domain::time::EpochMillis;

/// Default number of rows returned by a history query.
pub const DEFAULT_HISTORY_LIMIT: usize = 2000;

/// Which stream a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryCategory {
    Sensors,
    Valves,
}

impl HistoryCategory {
    /// Storage name of the category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sensors => "sensors",
            Self::Valves => "valves",
        }
    }
}

/// One accepted inbound message, as it was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub category: HistoryCategory,
    pub device_id: String,
    pub ts: EpochMillis,
    pub payload: serde_json::Value,
}

/// Filter for [`HistoryLog::range`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub category: HistoryCategory,
    pub device_id: String,
    /// Inclusive lower bound.
    pub from: Option<EpochMillis>,
    /// Inclusive upper bound.
    pub to: Option<EpochMillis>,
    pub limit: usize,
}

impl HistoryQuery {
    #[must_use]
    pub fn new(category: HistoryCategory, device_id: impl Into<String>) -> Self {
        Self {
            category,
            device_id: device_id.into(),
            from: None,
            to: None,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Whether `record` falls inside this query, ignoring the limit.
    #[must_use]
    pub fn matches(&self, record: &HistoryRecord) -> bool {
        record.category == self.category
            && record.device_id == self.device_id
            && self.from.is_none_or(|from| record.ts >= from)
            && self.to.is_none_or(|to| record.ts <= to)
    }
}

/// Append-only history storage.
pub trait HistoryLog {
    fn append(
        &self,
        record: HistoryRecord,
    ) -> impl Future<Output = Result<(), IrrigationError>> + Send;

    /// Records matching `query`, oldest first, at most `query.limit`.
    fn range(
        &self,
        query: HistoryQuery,
    ) -> impl Future<Output = Result<Vec<HistoryRecord>, IrrigationError>> + Send;
}

impl<T: HistoryLog + Send + Sync> HistoryLog for std::sync::Arc<T> {
    fn append(
        &self,
        record: HistoryRecord,
    ) -> impl Future<Output = Result<(), IrrigationError>> + Send {
        (**self).append(record)
    }

    fn range(
        &self,
        query: HistoryQuery,
    ) -> impl Future<Output = Result<Vec<HistoryRecord>, IrrigationError>> + Send {
        (**self).range(query)
    }
}
