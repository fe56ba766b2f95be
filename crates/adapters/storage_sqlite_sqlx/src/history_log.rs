//! `SQLite` implementation of [`HistoryLog`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use irrihub_app::ports::{HistoryCategory, HistoryLog, HistoryQuery, HistoryRecord};
use irrihub_domain::error::IrrigationError;

use crate::error::StorageError;

/// Wrapper for converting database rows into port records.
struct Wrapper(HistoryRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let category: String = row.try_get("category")?;
        let device_id: String = row.try_get("device_id")?;
        let ts: i64 = row.try_get("ts")?;
        let payload: String = row.try_get("payload")?;

        let category = parse_category(&category)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let payload = serde_json::from_str(&payload)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(HistoryRecord {
            category,
            device_id,
            ts,
            payload,
        }))
    }
}

fn parse_category(value: &str) -> Result<HistoryCategory, StorageError> {
    match value {
        "sensors" => Ok(HistoryCategory::Sensors),
        "valves" => Ok(HistoryCategory::Valves),
        other => Err(StorageError::UnknownCategory(other.to_string())),
    }
}

const INSERT: &str = r"
    INSERT INTO history (category, device_id, ts, payload)
    VALUES (?, ?, ?, ?)
";

const SELECT_IN_RANGE: &str = r"
    SELECT category, device_id, ts, payload FROM history
    WHERE category = ? AND device_id = ? AND ts >= ? AND ts <= ?
    ORDER BY ts ASC, id ASC
    LIMIT ?
";

/// Append-only sensor and valve history.
pub struct SqliteHistoryLog {
    pool: SqlitePool,
}

impl SqliteHistoryLog {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl HistoryLog for SqliteHistoryLog {
    async fn append(&self, record: HistoryRecord) -> Result<(), IrrigationError> {
        let payload = serde_json::to_string(&record.payload).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(record.category.as_str())
            .bind(&record.device_id)
            .bind(record.ts)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn range(&self, query: HistoryQuery) -> Result<Vec<HistoryRecord>, IrrigationError> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_IN_RANGE)
            .bind(query.category.as_str())
            .bind(&query.device_id)
            .bind(query.from.unwrap_or(i64::MIN))
            .bind(query.to.unwrap_or(i64::MAX))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
