//! Storage-specific error type wrapping sqlx errors.

use irrihub_domain::error::IrrigationError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// A stored document is not valid JSON.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// A stored history category is unknown.
    #[error("unknown history category {0:?}")]
    UnknownCategory(String),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for IrrigationError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_into_storage_error() {
        let err: IrrigationError = StorageError::UnknownCategory("pumps".to_string()).into();
        assert!(matches!(err, IrrigationError::Storage(_)));
    }
}
